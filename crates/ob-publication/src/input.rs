//! # Publication Input Data
//!
//! Everything an act package is built from: the minted FRBRs, the policy
//! objects in use, and the werkingsgebieden, documents and assets they pull
//! in. [`crate::mutation::PatchActMutation`] rewrites this data against the
//! previous state before the package is built.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ob_core::{ActFrbr, DocumentType, Frbr, ProcedureType, Purpose};
use ob_state::PackageType;

use crate::state::ow::OwState;

// ─── Source objects ─────────────────────────────────────────────────

/// Geometry behind a werkingsgebied object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub uuid: Uuid,
    pub title: String,
    pub gml: String,
}

/// Stored file behind a document object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub uuid: Uuid,
    pub filename: String,
    pub content_type: String,
    pub checksum: String,
}

/// A policy object as it enters a publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationObject {
    pub uuid: Uuid,
    pub code: String,
    pub object_type: String,
    pub object_id: i64,
    pub title: String,
    /// HTML body; may reference werkingsgebieden through
    /// `data-hint-locatie` and assets through `<img>`.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub werkingsgebied_code: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub assets: Vec<Uuid>,
    #[serde(default)]
    pub area: Option<Area>,
    #[serde(default)]
    pub file: Option<StoredFile>,
}

fn template_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<object\b[^>]*\bcode="([^"]+)""#).expect("template object regex is valid")
    })
}

/// Object codes a text template places in the act:
/// `<object code="beleidskeuze-4"/>`.
pub fn used_object_codes(template: &str) -> BTreeSet<String> {
    template_object_regex()
        .captures_iter(template)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

// ─── Resolved publication data ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLocation {
    pub uuid: String,
    pub identifier: String,
    pub gml_id: String,
    pub group_id: String,
    pub title: String,
    pub gml: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputWerkingsgebied {
    pub uuid: String,
    pub identifier: String,
    pub hash: String,
    pub object_id: i64,
    pub code: String,
    /// Whether this expression is delivered; unchanged ones are not.
    pub new: bool,
    pub frbr: Frbr,
    pub title: String,
    /// Work of the act that first published this werkingsgebied.
    pub owner_act: String,
    pub locations: Vec<InputLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDocument {
    pub uuid: String,
    pub code: String,
    pub frbr: Frbr,
    pub new: bool,
    pub filename: String,
    pub title: String,
    pub owner_act: String,
    pub content_type: String,
    pub object_id: i64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAsset {
    pub uuid: String,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaOfJurisdiction {
    pub uuid: Uuid,
    pub title: String,
    pub administrative_borders_id: String,
    pub administrative_borders_domain: String,
    pub administrative_borders_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationData {
    pub used_object_codes: BTreeSet<String>,
    pub objects: Vec<PublicationObject>,
    pub werkingsgebieden: Vec<InputWerkingsgebied>,
    pub documents: Vec<InputDocument>,
    pub assets: Vec<InputAsset>,
    pub area_of_jurisdiction: Option<AreaOfJurisdiction>,
}

// ─── Act mutation ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedWerkingsgebied {
    pub uuid: String,
    pub code: String,
    pub object_id: i64,
    pub owner_act: String,
    pub title: String,
    pub frbr: Frbr,
}

/// What the package amends: the consolidated act as the environment knows
/// it, and the werkingsgebieden that drop out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActMutation {
    pub consolidated_act_frbr: ActFrbr,
    pub consolidated_act_text: String,
    pub known_wid_map: BTreeMap<String, String>,
    pub known_wids: Vec<String>,
    pub removed_werkingsgebieden: Vec<RemovedWerkingsgebied>,
}

// ─── Package input ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActInputData {
    pub bill_frbr: Frbr,
    pub act_frbr: ActFrbr,
    pub consolidation_purpose: Purpose,
    pub publication_data: PublicationData,
    pub package_type: PackageType,
    pub document_type: DocumentType,
    pub procedure_type: ProcedureType,
    pub publication_version_uuid: Uuid,
    pub province_id: String,
    pub act_mutation: Option<ActMutation>,
    pub ow_state: Option<OwState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementInputData {
    pub doc_frbr: Frbr,
    pub about_act_frbr: Frbr,
    pub about_bill_frbr: Frbr,
    pub document_type: DocumentType,
    pub procedure_type: ProcedureType,
}
