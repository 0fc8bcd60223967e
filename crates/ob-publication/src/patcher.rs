//! # State Patchers
//!
//! Produce the state an environment will have once a package is accepted.
//! The source state is never modified; a patcher works on a copy and
//! applies the package through [`Action`]s.

use std::collections::BTreeMap;

use ob_core::parse_date;

use crate::act_text::RenderedAct;
use crate::actions::{Action, AddAnnouncementAction, AddPublicationAction, AddPurposeAction};
use crate::error::PublicationError;
use crate::input::{ActInputData, AnnouncementInputData, InputDocument, InputWerkingsgebied};
use crate::state::ow::OwState;
use crate::state::v5::Werkingsgebied;
use crate::state::{Asset, Document, Location, StateV5};

pub struct ActStatePatcher<'a> {
    input: &'a ActInputData,
    rendered: &'a RenderedAct,
    ow_state: &'a OwState,
}

impl<'a> ActStatePatcher<'a> {
    pub fn new(input: &'a ActInputData, rendered: &'a RenderedAct, ow_state: &'a OwState) -> Self {
        Self {
            input,
            rendered,
            ow_state,
        }
    }

    pub fn apply(&self, source: &StateV5) -> Result<StateV5, PublicationError> {
        let mut state = source.clone();
        state.handle_action(Action::AddPublication(Box::new(self.publication_action()?)));
        state.handle_action(Action::AddPurpose(self.purpose_action()?));
        Ok(state)
    }

    fn publication_action(&self) -> Result<AddPublicationAction, PublicationError> {
        if self.rendered.act_text.is_empty() {
            return Err(PublicationError::MissingActText);
        }

        let data = &self.input.publication_data;
        let werkingsgebieden = data
            .werkingsgebieden
            .iter()
            .map(|w| (w.object_id, stored_werkingsgebied(w)))
            .collect();
        let documents = data
            .documents
            .iter()
            .map(|d| (d.object_id, stored_document(d)))
            .collect();
        let assets: BTreeMap<String, Asset> = self
            .rendered
            .asset_uuids
            .iter()
            .map(|uuid| (uuid.clone(), Asset { uuid: uuid.clone() }))
            .collect();

        Ok(AddPublicationAction {
            act_frbr: self.input.act_frbr.frbr.clone(),
            bill_frbr: self.input.bill_frbr.clone(),
            consolidation_purpose: self.input.consolidation_purpose.clone(),
            document_type: self.input.document_type,
            procedure_type: self.input.procedure_type,
            werkingsgebieden,
            documents,
            assets,
            wid_data: self.rendered.wid_data.clone(),
            ow_state: self.ow_state.clone(),
            act_text: self.rendered.act_text.clone(),
            publication_version_uuid: self.input.publication_version_uuid.to_string(),
        })
    }

    fn purpose_action(&self) -> Result<AddPurposeAction, PublicationError> {
        let purpose = &self.input.consolidation_purpose;
        let effective_date = purpose
            .effective_date
            .as_deref()
            .map(parse_date)
            .transpose()?;
        Ok(AddPurposeAction {
            purpose_type: purpose.purpose_type,
            effective_date,
            work_province_id: purpose.work_province_id.clone(),
            work_date: purpose.work_date.clone(),
            work_other: purpose.work_other.clone(),
        })
    }
}

fn stored_werkingsgebied(w: &InputWerkingsgebied) -> Werkingsgebied {
    Werkingsgebied {
        uuid: w.uuid.clone(),
        identifier: w.identifier.clone(),
        hash: w.hash.clone(),
        object_id: w.object_id,
        title: w.title.clone(),
        owner_act: w.owner_act.clone(),
        frbr: ob_core::Frbr {
            work_country: String::new(),
            ..w.frbr.clone()
        },
        locations: w
            .locations
            .iter()
            .map(|l| Location {
                uuid: l.uuid.clone(),
                identifier: l.identifier.clone(),
                gml_id: l.gml_id.clone(),
                group_id: l.group_id.clone(),
                title: l.title.clone(),
            })
            .collect(),
    }
}

fn stored_document(d: &InputDocument) -> Document {
    Document {
        uuid: d.uuid.clone(),
        code: d.code.clone(),
        frbr: ob_core::Frbr {
            work_country: String::new(),
            ..d.frbr.clone()
        },
        filename: d.filename.clone(),
        title: d.title.clone(),
        owner_act: d.owner_act.clone(),
        content_type: d.content_type.clone(),
        object_id: d.object_id,
        hash: d.hash.clone(),
    }
}

pub struct AnnouncementStatePatcher<'a> {
    input: &'a AnnouncementInputData,
}

impl<'a> AnnouncementStatePatcher<'a> {
    pub fn new(input: &'a AnnouncementInputData) -> Self {
        Self { input }
    }

    pub fn apply(&self, source: &StateV5) -> StateV5 {
        let mut state = source.clone();
        state.handle_action(Action::AddAnnouncement(AddAnnouncementAction {
            doc_frbr: self.input.doc_frbr.clone(),
            about_act_frbr: self.input.about_act_frbr.clone(),
            about_bill_frbr: self.input.about_bill_frbr.clone(),
            document_type: self.input.document_type,
            procedure_type: self.input.procedure_type,
        }));
        state
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::input::InputLocation;
    use crate::state::WidData;
    use crate::test_support::{act_input, frbr};
    use ob_core::{DocumentType, ProcedureType};

    fn rendered(act_text: &str) -> RenderedAct {
        RenderedAct {
            act_text: act_text.into(),
            wid_data: WidData {
                known_wid_map: [("beleidskeuze-1".to_string(), "w1".to_string())].into(),
                known_wids: vec!["w1".into()],
            },
            asset_uuids: BTreeSet::from(["a1".to_string()]),
        }
    }

    #[test]
    fn act_is_stored_under_document_and_procedure_type() {
        let mut input = act_input();
        input.consolidation_purpose.effective_date = Some("2024-06-01".into());
        input.publication_data.werkingsgebieden = vec![InputWerkingsgebied {
            uuid: "wg".into(),
            identifier: "id".into(),
            hash: "h".into(),
            object_id: 3,
            code: "werkingsgebied-3".into(),
            new: true,
            frbr: frbr("2_1-1-3", 1),
            title: "Bodem".into(),
            owner_act: "/akn/nl/act/pv28/2024/2_1".into(),
            locations: vec![InputLocation {
                uuid: "wg".into(),
                identifier: "l".into(),
                gml_id: "g".into(),
                group_id: "gr".into(),
                title: "Bodem".into(),
                gml: "<gml/>".into(),
            }],
        }];

        let rendered = rendered("<RegelingVrijetekst/>");
        let source = StateV5::default();
        let state = ActStatePatcher::new(&input, &rendered, &OwState::default())
            .apply(&source)
            .unwrap();

        assert_eq!(source, StateV5::default());
        let act = state
            .get_act(DocumentType::Omgevingsvisie, ProcedureType::Final)
            .unwrap();
        assert_eq!(act.act_frbr, input.act_frbr.frbr);
        assert_eq!(act.werkingsgebieden[&3].frbr.work_country, "");
        assert_eq!(act.werkingsgebieden[&3].locations.len(), 1);
        assert_eq!(act.wid_data.known_wids, vec!["w1".to_string()]);
        assert!(act.assets.contains_key("a1"));
        assert_eq!(act.publication_version_uuid, input.publication_version_uuid.to_string());

        let purpose = &state.purposes[&input.consolidation_purpose.frbr_work()];
        assert_eq!(purpose.effective_date.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn empty_act_text_is_rejected() {
        let input = act_input();
        let rendered = rendered("");
        assert!(matches!(
            ActStatePatcher::new(&input, &rendered, &OwState::default()).apply(&StateV5::default()),
            Err(PublicationError::MissingActText)
        ));
    }

    #[test]
    fn announcement_is_added() {
        let input = AnnouncementInputData {
            doc_frbr: frbr("kennisgeving-1", 1),
            about_act_frbr: frbr("2_1", 1),
            about_bill_frbr: frbr("2_1", 1),
            document_type: DocumentType::Programma,
            procedure_type: ProcedureType::Draft,
        };
        let state = AnnouncementStatePatcher::new(&input).apply(&StateV5::default());
        let announcement = state
            .get_announcement(DocumentType::Programma, ProcedureType::Draft)
            .unwrap();
        assert_eq!(announcement.doc_frbr.work_other, "kennisgeving-1");
    }
}
