//! Schema version 5, the current state: OW data is replaced by a typed
//! [`OwState`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ob_core::{DocumentType, Frbr, ProcedureType, Purpose};

use super::common::{act_key, ActiveAnnouncement, Asset, Document, Location, WidData};
use super::ow::OwState;
use crate::actions::{
    Action, AddAnnouncementAction, AddPublicationAction, AddPurposeAction,
};

pub const SCHEMA_VERSION: u32 = 5;

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

impl Werkingsgebied {
    /// Locations minted before identifiers were UUIDs are no longer
    /// accepted. Such a werkingsgebied is republished as a new expression.
    pub fn is_still_valid(&self) -> bool {
        self.locations.iter().all(|l| {
            [&l.uuid, &l.identifier, &l.gml_id, &l.group_id]
                .iter()
                .all(|id| Uuid::parse_str(id).is_ok())
        })
    }
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
    #[serde(rename = "Ow_State")]
    pub ow_state: OwState,
    #[serde(rename = "Act_Text")]
    pub act_text: String,
    #[serde(rename = "Publication_Version_UUID")]
    pub publication_version_uuid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateV5 {
    #[serde(rename = "Purposes", default)]
    pub purposes: BTreeMap<String, Purpose>,
    #[serde(rename = "Acts", default)]
    pub acts: BTreeMap<String, ActiveAct>,
    #[serde(rename = "Announcements", default)]
    pub announcements: BTreeMap<String, ActiveAnnouncement>,
}

impl StateV5 {
    pub fn get_act(
        &self,
        document_type: DocumentType,
        procedure_type: ProcedureType,
    ) -> Option<&ActiveAct> {
        self.acts.get(&act_key(document_type, procedure_type))
    }

    pub fn get_announcement(
        &self,
        document_type: DocumentType,
        procedure_type: ProcedureType,
    ) -> Option<&ActiveAnnouncement> {
        self.announcements
            .get(&act_key(document_type, procedure_type))
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::AddPurpose(a) => self.add_purpose(a),
            Action::AddPublication(a) => self.add_publication(*a),
            Action::AddAnnouncement(a) => self.add_announcement(a),
        }
    }

    fn add_purpose(&mut self, action: AddPurposeAction) {
        let purpose = Purpose {
            purpose_type: action.purpose_type,
            effective_date: action.effective_date.map(ob_core::format_date),
            work_province_id: action.work_province_id,
            work_date: action.work_date,
            work_other: action.work_other,
        };
        self.purposes.insert(purpose.frbr_work(), purpose);
    }

    fn add_publication(&mut self, action: AddPublicationAction) {
        let key = act_key(action.document_type, action.procedure_type);
        let act = ActiveAct {
            act_frbr: action.act_frbr,
            bill_frbr: action.bill_frbr,
            consolidation_purpose: action.consolidation_purpose,
            document_type: action.document_type,
            procedure_type: action.procedure_type,
            werkingsgebieden: action.werkingsgebieden,
            documents: action.documents,
            assets: action.assets,
            wid_data: action.wid_data,
            ow_state: action.ow_state,
            act_text: action.act_text,
            publication_version_uuid: action.publication_version_uuid,
        };
        self.acts.insert(key, act);
    }

    fn add_announcement(&mut self, action: AddAnnouncementAction) {
        let key = act_key(action.document_type, action.procedure_type);
        self.announcements.insert(
            key,
            ActiveAnnouncement {
                doc_frbr: action.doc_frbr,
                about_act_frbr: action.about_act_frbr,
                about_bill_frbr: action.about_bill_frbr,
                document_type: action.document_type,
                procedure_type: action.procedure_type,
            },
        );
    }
}
