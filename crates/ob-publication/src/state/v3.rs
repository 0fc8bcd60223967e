//! Schema version 3: acts list the assets referenced from their text and
//! the documents published with them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ob_core::{DocumentType, Frbr, ProcedureType, Purpose};

use super::common::{ActiveAnnouncement, Asset, Document, WidData};
pub use super::v2::{OwData, Werkingsgebied};

pub const SCHEMA_VERSION: u32 = 3;

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
pub struct StateV3 {
    #[serde(rename = "Purposes", default)]
    pub purposes: BTreeMap<String, Purpose>,
    #[serde(rename = "Acts", default)]
    pub acts: BTreeMap<String, ActiveAct>,
    #[serde(rename = "Announcements", default)]
    pub announcements: BTreeMap<String, ActiveAnnouncement>,
}
