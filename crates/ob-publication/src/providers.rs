//! # FRBR and Publication Data Providers
//!
//! Mint the identifiers of a new package and resolve the werkingsgebieden,
//! documents and assets the used objects pull in. Every werkingsgebied and
//! document is minted as if it were published for the first time under the
//! current act expression. [`crate::mutation::PatchActMutation`] then
//! restores the identity of those already known to the environment.
//!
//! ```text
//! act       /akn/nl/act/{prov}/{year}/{work_other}            version = prior + 1
//! gio       /join/id/regdata/{prov}/{act date}/{act}-{ver}-{object}
//! file      /join/id/regdata/{prov}/{act date}/file-{act}-{ver}-{object}
//! purpose   /join/id/proces/{prov}/{year}/{kind}-{act work_other}-{ver}
//! ```

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use uuid::Uuid;

use ob_core::{sha512_hex, today, today_str, ActFrbr, Frbr, Purpose, PurposeType};

use crate::error::PublicationError;
use crate::input::{InputAsset, InputDocument, InputLocation, InputWerkingsgebied, PublicationObject};

// ─── FRBR minting ───────────────────────────────────────────────────

/// Static identity of an act within an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActIdentity {
    pub act_id: i64,
    pub province_id: String,
    pub country: String,
    pub language: String,
    pub work_date: String,
    pub work_other: String,
}

/// Next act expression, dated today.
pub fn act_frbr(identity: &ActIdentity, prior_versions: u32) -> ActFrbr {
    ActFrbr {
        act_id: identity.act_id,
        frbr: Frbr {
            work_province_id: identity.province_id.clone(),
            work_country: identity.country.clone(),
            work_date: identity.work_date.clone(),
            work_other: identity.work_other.clone(),
            expression_language: identity.language.clone(),
            expression_date: today_str(),
            expression_version: prior_versions + 1,
        },
    }
}

/// A bill or announcement doc: a new work each time, dated this year.
pub fn new_work_frbr(act: &ActFrbr, work_other: impl Into<String>) -> Frbr {
    Frbr {
        work_province_id: act.frbr.work_province_id.clone(),
        work_country: act.frbr.work_country.clone(),
        work_date: today().year().to_string(),
        work_other: work_other.into(),
        expression_language: act.frbr.expression_language.clone(),
        expression_date: today_str(),
        expression_version: 1,
    }
}

pub fn consolidation_purpose(
    act: &ActFrbr,
    purpose_type: PurposeType,
    effective_date: Option<NaiveDate>,
) -> Purpose {
    let prefix = match purpose_type {
        PurposeType::Consolidation => "instelling",
        PurposeType::Withdrawal => "intrekking",
    };
    Purpose {
        purpose_type,
        effective_date: effective_date.map(ob_core::format_date),
        work_province_id: act.frbr.work_province_id.clone(),
        work_date: today().year().to_string(),
        work_other: format!(
            "{prefix}-{}-{}",
            act.frbr.work_other, act.frbr.expression_version
        ),
    }
}

// ─── Werkingsgebieden ───────────────────────────────────────────────

fn hint_locatie_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<a[^>]*data-hint-locatie="(.*?)"[^>]*>"#).expect("hint regex is valid")
    })
}

/// Werkingsgebied codes referenced by the used objects, either directly or
/// through a gebiedsaanwijzing hint in their text.
pub fn werkingsgebied_codes(used_objects: &[PublicationObject]) -> BTreeSet<String> {
    let direct = used_objects
        .iter()
        .filter_map(|o| o.werkingsgebied_code.clone());
    let hinted = used_objects.iter().flat_map(|o| {
        hint_locatie_regex()
            .captures_iter(&o.text)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect::<Vec<_>>()
    });
    direct.chain(hinted).collect()
}

pub fn werkingsgebieden(
    act: &ActFrbr,
    all_objects: &[PublicationObject],
    used_objects: &[PublicationObject],
) -> Result<Vec<InputWerkingsgebied>, PublicationError> {
    let codes = werkingsgebied_codes(used_objects);
    all_objects
        .iter()
        .filter(|o| o.object_type == "werkingsgebied" && codes.contains(&o.code))
        .map(|o| as_input_werkingsgebied(act, o))
        .collect()
}

fn as_input_werkingsgebied(
    act: &ActFrbr,
    object: &PublicationObject,
) -> Result<InputWerkingsgebied, PublicationError> {
    let area = object
        .area
        .as_ref()
        .ok_or_else(|| PublicationError::MissingArea(object.code.clone()))?;

    let frbr = Frbr {
        work_province_id: act.frbr.work_province_id.clone(),
        work_country: String::new(),
        work_date: act.frbr.work_date.clone(),
        work_other: format!(
            "{}-{}-{}",
            act.act_id, act.frbr.expression_version, object.object_id
        ),
        expression_language: act.frbr.expression_language.clone(),
        expression_date: today_str(),
        expression_version: 1,
    };

    Ok(InputWerkingsgebied {
        uuid: object.uuid.to_string(),
        identifier: Uuid::new_v4().to_string(),
        hash: sha512_hex(area.gml.as_bytes()),
        object_id: object.object_id,
        code: object.code.clone(),
        new: true,
        frbr,
        title: area.title.clone(),
        owner_act: act.work(),
        locations: vec![InputLocation {
            uuid: object.uuid.to_string(),
            identifier: Uuid::new_v4().to_string(),
            gml_id: Uuid::new_v4().to_string(),
            group_id: Uuid::new_v4().to_string(),
            title: area.title.clone(),
            gml: area.gml.clone(),
        }],
    })
}

// ─── Documents ──────────────────────────────────────────────────────

pub fn documents(
    act: &ActFrbr,
    all_objects: &[PublicationObject],
    used_objects: &[PublicationObject],
) -> Result<Vec<InputDocument>, PublicationError> {
    let codes: BTreeSet<&str> = used_objects
        .iter()
        .flat_map(|o| o.documents.iter().map(String::as_str))
        .collect();

    let result = all_objects
        .iter()
        .filter(|o| o.object_type == "document" && codes.contains(o.code.as_str()))
        .map(|o| as_input_document(act, o))
        .collect::<Result<Vec<_>, _>>()?;

    let filenames: BTreeSet<&str> = result.iter().map(|d| d.filename.as_str()).collect();
    if filenames.len() != result.len() {
        return Err(PublicationError::DuplicateDocumentFilenames);
    }
    Ok(result)
}

fn as_input_document(
    act: &ActFrbr,
    object: &PublicationObject,
) -> Result<InputDocument, PublicationError> {
    let file = object
        .file
        .as_ref()
        .ok_or_else(|| PublicationError::MissingFile(object.code.clone()))?;

    Ok(InputDocument {
        uuid: object.uuid.to_string(),
        code: object.code.clone(),
        frbr: Frbr {
            work_province_id: act.frbr.work_province_id.clone(),
            work_country: String::new(),
            work_date: act.frbr.work_date.clone(),
            work_other: format!(
                "file-{}-{}-{}",
                act.act_id, act.frbr.expression_version, object.object_id
            ),
            expression_language: act.frbr.expression_language.clone(),
            expression_date: today_str(),
            expression_version: 1,
        },
        new: true,
        filename: file.filename.clone(),
        title: object.title.clone(),
        owner_act: act.work(),
        content_type: file.content_type.clone(),
        object_id: object.object_id,
        hash: file.checksum.clone(),
    })
}

// ─── Assets ─────────────────────────────────────────────────────────

/// Resolves stored assets by uuid.
pub trait AssetProvider {
    fn get_assets_by_uuids(&self, uuids: &[Uuid]) -> Result<Vec<InputAsset>, PublicationError>;
}

pub fn assets(
    used_objects: &[PublicationObject],
    provider: &dyn AssetProvider,
) -> Result<Vec<InputAsset>, PublicationError> {
    let uuids: BTreeSet<Uuid> = used_objects
        .iter()
        .flat_map(|o| o.assets.iter().copied())
        .collect();
    provider.get_assets_by_uuids(&uuids.into_iter().collect::<Vec<_>>())
}
