//! Models whose stored shape has not changed across schema versions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ob_core::{DocumentType, Frbr, ProcedureType};

/// Key acts and announcements are stored under:
/// `"{document_type}-{procedure_type}"`.
pub fn act_key(document_type: DocumentType, procedure_type: ProcedureType) -> String {
    format!("{}-{}", document_type.as_str(), procedure_type.as_str())
}

/// Known wIds of the consolidated act text.
///
/// The map pins an object code to the wId it was rendered with, so the same
/// object keeps its wId across amendments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidData {
    #[serde(rename = "Known_Wid_Map")]
    pub known_wid_map: BTreeMap<String, String>,
    #[serde(rename = "Known_Wids")]
    pub known_wids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "UUID")]
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "UUID")]
    pub uuid: String,
    /// `basisgeo:id`, also referenced from OW.
    #[serde(rename = "Identifier")]
    pub identifier: String,
    #[serde(rename = "Gml_ID")]
    pub gml_id: String,
    #[serde(rename = "Group_ID")]
    pub group_id: String,
    #[serde(rename = "Title")]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Frbr")]
    pub frbr: Frbr,
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Owner_Act")]
    pub owner_act: String,
    #[serde(rename = "Content_Type")]
    pub content_type: String,
    #[serde(rename = "Object_ID")]
    pub object_id: i64,
    #[serde(rename = "Hash")]
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAnnouncement {
    #[serde(rename = "Doc_Frbr")]
    pub doc_frbr: Frbr,
    #[serde(rename = "About_Act_Frbr")]
    pub about_act_frbr: Frbr,
    #[serde(rename = "About_Bill_Frbr")]
    pub about_bill_frbr: Frbr,
    #[serde(rename = "Document_Type")]
    pub document_type: DocumentType,
    #[serde(rename = "Procedure_Type")]
    pub procedure_type: ProcedureType,
}

/// A state as persisted: the schema version next to the raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub schema_version: u32,
    pub data: serde_json::Value,
}
