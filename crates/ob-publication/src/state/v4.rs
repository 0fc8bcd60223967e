//! Schema version 4: werkingsgebieden are made of locations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ob_core::{DocumentType, Frbr, ProcedureType, Purpose};

use super::common::{ActiveAnnouncement, Asset, Document, Location, WidData};
pub use super::v2::OwData;

pub const SCHEMA_VERSION: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Werkingsgebied {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "Identifier")]
    pub identifier: String,
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "Object_ID")]
    pub object_id: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Owner_Act")]
    pub owner_act: String,
    #[serde(rename = "Frbr")]
    pub frbr: Frbr,
    #[serde(rename = "Locations")]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAct {
    #[serde(rename = "Act_Frbr")]
    pub act_frbr: Frbr,
    #[serde(rename = "Bill_Frbr")]
    pub bill_frbr: Frbr,
    #[serde(rename = "Consolidation_Purpose")]
    pub consolidation_purpose: Purpose,
    #[serde(rename = "Document_Type")]
    pub document_type: DocumentType,
    #[serde(rename = "Procedure_Type")]
    pub procedure_type: ProcedureType,
    #[serde(rename = "Werkingsgebieden")]
    pub werkingsgebieden: BTreeMap<i64, Werkingsgebied>,
    #[serde(rename = "Documents", default)]
    pub documents: BTreeMap<i64, Document>,
    #[serde(rename = "Assets")]
    pub assets: BTreeMap<String, Asset>,
    #[serde(rename = "Wid_Data")]
    pub wid_data: WidData,
    #[serde(rename = "Ow_Data")]
    pub ow_data: OwData,
    #[serde(rename = "Act_Text")]
    pub act_text: String,
    #[serde(rename = "Publication_Version_UUID")]
    pub publication_version_uuid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateV4 {
    #[serde(rename = "Purposes", default)]
    pub purposes: BTreeMap<String, Purpose>,
    #[serde(rename = "Acts", default)]
    pub acts: BTreeMap<String, ActiveAct>,
    #[serde(rename = "Announcements", default)]
    pub announcements: BTreeMap<String, ActiveAnnouncement>,
}
