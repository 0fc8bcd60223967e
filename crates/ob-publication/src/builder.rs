//! # Package Builders
//!
//! An [`ActPackageBuilder`] takes minted input and the environment's
//! current state, reconciles the two, validates the result and prepares
//! everything a package needs: the act text, the OW delta, the package
//! archive and the state the environment moves to once LVBB accepts it.
//!
//! ```text
//! ActInputData ──▶ PatchActMutation ──▶ validation ──▶ act text ──▶ OW delta
//!                  (state has act)                                    │
//!                                       ActStatePatcher ◀─────────────┘
//! ```
//!
//! The archive is a JSON manifest of the delivery. Its SHA-256 is what the
//! API stores as the package checksum.

use serde::Serialize;
use uuid::Uuid;

use ob_core::{sha256_hex, WorkKind};
use ob_state::PackageType;

use crate::act_text::{render_act_text, RenderedAct};
use crate::error::PublicationError;
use crate::input::{ActInputData, AnnouncementInputData};
use crate::mutation::PatchActMutation;
use crate::ow_builder::{build_ow_delta, OwDelta};
use crate::patcher::{ActStatePatcher, AnnouncementStatePatcher};
use crate::providers::AssetProvider;
use crate::state::StateV5;
use crate::validation::ValidatePublicationService;

/// A serialised package as handed to LVBB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageZip {
    pub filename: String,
    pub checksum: String,
    pub content: Vec<u8>,
}

impl PackageZip {
    fn from_manifest<T: Serialize>(filename: String, manifest: &T) -> Result<Self, PublicationError> {
        let content = serde_json::to_vec_pretty(manifest)?;
        Ok(Self {
            filename,
            checksum: sha256_hex(&content),
            content,
        })
    }
}

#[derive(Serialize)]
struct GioEntry<'a> {
    expression: String,
    title: &'a str,
    hash: &'a str,
}

#[derive(Serialize)]
struct DocumentEntry<'a> {
    expression: String,
    filename: &'a str,
    hash: &'a str,
}

#[derive(Serialize)]
struct ActManifest<'a> {
    delivery_id: Uuid,
    package_type: PackageType,
    bill: String,
    act: String,
    purpose: String,
    act_text: &'a str,
    gios: Vec<GioEntry<'a>>,
    removed_gios: Vec<String>,
    documents: Vec<DocumentEntry<'a>>,
    ow_changed: usize,
    ow_terminated: &'a [String],
}

pub struct ActPackageBuilder {
    input: ActInputData,
    source_state: Option<StateV5>,
    rendered: RenderedAct,
    ow_delta: OwDelta,
    delivery_id: Uuid,
}

impl ActPackageBuilder {
    /// `source_state` is `None` for environments that do not track state.
    pub fn new(
        input: ActInputData,
        source_state: Option<StateV5>,
        asset_provider: &dyn AssetProvider,
    ) -> Result<Self, PublicationError> {
        let active_act = source_state
            .as_ref()
            .and_then(|s| s.get_act(input.document_type, input.procedure_type));
        let input = match active_act {
            Some(act) => PatchActMutation::new(asset_provider, act).patch(input)?,
            None => input,
        };

        let errors = ValidatePublicationService::default().validate(&input);
        if !errors.is_empty() {
            return Err(PublicationError::Validation(errors));
        }

        let rendered = render_act_text(&input)?;
        let ow_delta = build_ow_delta(&input, &rendered.wid_data.known_wid_map);

        tracing::debug!(
            act = %input.act_frbr.expression(),
            werkingsgebieden = input.publication_data.werkingsgebieden.len(),
            ow_changed = ow_delta.changed_count(),
            ow_terminated = ow_delta.terminated.len(),
            "act package prepared"
        );

        Ok(Self {
            input,
            source_state,
            rendered,
            ow_delta,
            delivery_id: Uuid::new_v4(),
        })
    }

    pub fn delivery_id(&self) -> Uuid {
        self.delivery_id
    }

    pub fn input(&self) -> &ActInputData {
        &self.input
    }

    pub fn act_text(&self) -> &str {
        &self.rendered.act_text
    }

    pub fn ow_delta(&self) -> &OwDelta {
        &self.ow_delta
    }

    pub fn build_zip(&self) -> Result<PackageZip, PublicationError> {
        let data = &self.input.publication_data;
        let removed_gios = self
            .input
            .act_mutation
            .iter()
            .flat_map(|m| &m.removed_werkingsgebieden)
            .map(|w| w.frbr.expression(WorkKind::Gio))
            .collect();

        let manifest = ActManifest {
            delivery_id: self.delivery_id,
            package_type: self.input.package_type,
            bill: self.input.bill_frbr.expression(WorkKind::Bill),
            act: self.input.act_frbr.expression(),
            purpose: self.input.consolidation_purpose.frbr_work(),
            act_text: &self.rendered.act_text,
            gios: data
                .werkingsgebieden
                .iter()
                .filter(|w| w.new)
                .map(|w| GioEntry {
                    expression: w.frbr.expression(WorkKind::Gio),
                    title: &w.title,
                    hash: &w.hash,
                })
                .collect(),
            removed_gios,
            documents: data
                .documents
                .iter()
                .filter(|d| d.new)
                .map(|d| DocumentEntry {
                    expression: d.frbr.expression(WorkKind::File),
                    filename: &d.filename,
                    hash: &d.hash,
                })
                .collect(),
            ow_changed: self.ow_delta.changed_count(),
            ow_terminated: &self.ow_delta.terminated,
        };

        let filename = format!(
            "{}-{}-{}.zip",
            self.input.package_type.as_str().to_lowercase(),
            self.input.act_frbr.frbr.work_other,
            self.input.act_frbr.frbr.expression_version
        );
        PackageZip::from_manifest(filename, &manifest)
    }

    /// The state the environment will have once this package is accepted.
    pub fn create_new_state(&self) -> Result<StateV5, PublicationError> {
        let source = self
            .source_state
            .as_ref()
            .ok_or(PublicationError::NoSourceState)?;
        ActStatePatcher::new(&self.input, &self.rendered, &self.ow_delta.state).apply(source)
    }
}

#[derive(Serialize)]
struct AnnouncementManifest {
    delivery_id: Uuid,
    package_type: PackageType,
    doc: String,
    about_act: String,
    about_bill: String,
}

pub struct AnnouncementPackageBuilder {
    input: AnnouncementInputData,
    package_type: PackageType,
    source_state: Option<StateV5>,
    delivery_id: Uuid,
}

impl AnnouncementPackageBuilder {
    pub fn new(
        input: AnnouncementInputData,
        package_type: PackageType,
        source_state: Option<StateV5>,
    ) -> Self {
        Self {
            input,
            package_type,
            source_state,
            delivery_id: Uuid::new_v4(),
        }
    }

    pub fn delivery_id(&self) -> Uuid {
        self.delivery_id
    }

    pub fn build_zip(&self) -> Result<PackageZip, PublicationError> {
        let manifest = AnnouncementManifest {
            delivery_id: self.delivery_id,
            package_type: self.package_type,
            doc: self.input.doc_frbr.expression(WorkKind::Doc),
            about_act: self.input.about_act_frbr.expression(WorkKind::Act),
            about_bill: self.input.about_bill_frbr.expression(WorkKind::Bill),
        };
        let filename = format!(
            "{}-{}-{}.zip",
            self.package_type.as_str().to_lowercase(),
            self.input.doc_frbr.work_other,
            self.input.doc_frbr.expression_version
        );
        PackageZip::from_manifest(filename, &manifest)
    }

    pub fn create_new_state(&self) -> Result<StateV5, PublicationError> {
        let source = self
            .source_state
            .as_ref()
            .ok_or(PublicationError::NoSourceState)?;
        Ok(AnnouncementStatePatcher::new(&self.input).apply(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputAsset;
    use crate::test_support::{act_input, frbr, publication_object};
    use ob_core::{DocumentType, ProcedureType};

    struct NoAssets;

    impl AssetProvider for NoAssets {
        fn get_assets_by_uuids(&self, _uuids: &[Uuid]) -> Result<Vec<InputAsset>, PublicationError> {
            Ok(vec![])
        }
    }

    fn input() -> ActInputData {
        let mut data = act_input();
        data.publication_data.objects = vec![publication_object("beleidskeuze-1", 1)];
        data.publication_data.used_object_codes = ["beleidskeuze-1".to_string()].into();
        data
    }

    #[test]
    fn first_publication_builds_state_from_empty_source() {
        let builder = ActPackageBuilder::new(input(), Some(StateV5::default()), &NoAssets).unwrap();
        let state = builder.create_new_state().unwrap();
        let act = state
            .get_act(DocumentType::Omgevingsvisie, ProcedureType::Final)
            .unwrap();
        assert_eq!(act.act_text, builder.act_text());
        assert!(builder.input().act_mutation.is_none());
    }

    #[test]
    fn second_publication_reuses_wids() {
        let first = ActPackageBuilder::new(input(), Some(StateV5::default()), &NoAssets).unwrap();
        let state = first.create_new_state().unwrap();

        let mut next = input();
        next.act_frbr.frbr.expression_version = 2;
        next.act_frbr.frbr.work_other = "ander".into();
        let second = ActPackageBuilder::new(next, Some(state), &NoAssets).unwrap();

        assert!(second.input().act_mutation.is_some());
        assert!(first.act_text().contains("pv28_2_1__div_beleidskeuze_1"));
        assert!(second.act_text().contains("pv28_2_1__div_beleidskeuze_1"));
        assert!(!second.act_text().contains("pv28_ander__div"));
    }

    #[test]
    fn stateless_environment_cannot_create_state() {
        let builder = ActPackageBuilder::new(input(), None, &NoAssets).unwrap();
        assert!(matches!(
            builder.create_new_state(),
            Err(PublicationError::NoSourceState)
        ));
    }

    #[test]
    fn validation_errors_stop_the_build() {
        let mut data = input();
        data.publication_data.used_object_codes.clear();
        assert!(matches!(
            ActPackageBuilder::new(data, None, &NoAssets),
            Err(PublicationError::Validation(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn zip_checksum_covers_content() {
        let builder = ActPackageBuilder::new(input(), None, &NoAssets).unwrap();
        let zip = builder.build_zip().unwrap();
        assert_eq!(zip.checksum, sha256_hex(&zip.content));
        assert_eq!(zip.filename, "publication-2_1-1.zip");
        let manifest: serde_json::Value = serde_json::from_slice(&zip.content).unwrap();
        assert_eq!(manifest["delivery_id"], builder.delivery_id().to_string());
    }

    #[test]
    fn announcement_package_updates_announcements() {
        let builder = AnnouncementPackageBuilder::new(
            AnnouncementInputData {
                doc_frbr: frbr("kennisgeving-1", 1),
                about_act_frbr: frbr("2_1", 1),
                about_bill_frbr: frbr("2_1", 1),
                document_type: DocumentType::Omgevingsvisie,
                procedure_type: ProcedureType::Draft,
            },
            PackageType::Publication,
            Some(StateV5::default()),
        );
        let state = builder.create_new_state().unwrap();
        assert_eq!(state.announcements.len(), 1);
        assert_eq!(builder.build_zip().unwrap().filename, "publication-kennisgeving-1-1.zip");
    }
}
