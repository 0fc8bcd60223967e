//! Schema version 1: the first stored state. Werkingsgebieden carry no
//! title or hash, and OW data is an id mapping produced by the renderer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ob_core::{DocumentType, Frbr, ProcedureType, Purpose};

use super::common::{ActiveAnnouncement, WidData};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Werkingsgebied {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "Identifier", default)]
    pub identifier: Option<String>,
    #[serde(rename = "Object_ID")]
    pub object_id: i64,
    #[serde(rename = "Owner_Act")]
    pub owner_act: String,
    #[serde(rename = "Frbr")]
    pub frbr: Frbr,
}

/// Renderer id mappings, keyed by mapping kind
/// (`ambtsgebied`, `regelingsgebied`, `gebieden`, `gebiedengroep`, `wid`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwObjectMap {
    #[serde(default)]
    pub id_mapping: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub tekstdeel_mapping: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwData {
    #[serde(rename = "Object_Map", default)]
    pub object_map: OwObjectMap,
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
    #[serde(rename = "Wid_Data")]
    pub wid_data: WidData,
    #[serde(rename = "Ow_Data", default)]
    pub ow_data: OwData,
    #[serde(rename = "Act_Text")]
    pub act_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateV1 {
    #[serde(rename = "Purposes", default)]
    pub purposes: BTreeMap<String, Purpose>,
    #[serde(rename = "Acts", default)]
    pub acts: BTreeMap<String, ActiveAct>,
    #[serde(rename = "Announcements", default)]
    pub announcements: BTreeMap<String, ActiveAnnouncement>,
}
