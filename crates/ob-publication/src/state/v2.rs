//! Schema version 2: werkingsgebieden gain a title and GML hash, acts
//! record the publication version that produced them, and OW data becomes
//! a flat map of typed OW objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ob_core::{DocumentType, Frbr, ProcedureType, Purpose};

use super::common::{ActiveAnnouncement, WidData};

pub const SCHEMA_VERSION: u32 = 2;

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
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestuurlijkeGrenzenVerwijzing {
    pub bestuurlijke_grenzen_id: String,
    pub domein: String,
    pub geldig_op: String,
}

/// An OW object as the legacy renderer stored it. Which fields are present
/// depends on `ow_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyOwObject {
    #[serde(rename = "OW_ID")]
    pub ow_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub procedure_status: Option<String>,
    #[serde(default)]
    pub ow_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noemer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bestuurlijke_grenzen_verwijzing: Option<BestuurlijkeGrenzenVerwijzing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambtsgebied: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_geo_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gebieden: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_policy_object_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locaties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisie_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gio_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwData {
    #[serde(rename = "Ow_Objects", default)]
    pub ow_objects: BTreeMap<String, LegacyOwObject>,
    #[serde(rename = "Terminated_Ow_Ids", default)]
    pub terminated_ow_ids: Vec<String>,
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
    #[serde(rename = "Ow_Data")]
    pub ow_data: OwData,
    #[serde(rename = "Act_Text")]
    pub act_text: String,
    #[serde(rename = "Publication_Version_UUID")]
    pub publication_version_uuid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateV2 {
    #[serde(rename = "Purposes", default)]
    pub purposes: BTreeMap<String, Purpose>,
    #[serde(rename = "Acts", default)]
    pub acts: BTreeMap<String, ActiveAct>,
    #[serde(rename = "Announcements", default)]
    pub announcements: BTreeMap<String, ActiveAnnouncement>,
}
