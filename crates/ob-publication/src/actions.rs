//! # State Actions
//!
//! The only ways a state changes. A patcher builds an action from the new
//! package data and hands it to [`StateV5::handle_action`].
//!
//! [`StateV5::handle_action`]: crate::state::StateV5::handle_action

use std::collections::BTreeMap;

use chrono::NaiveDate;

use ob_core::{DocumentType, Frbr, ProcedureType, Purpose, PurposeType};

use crate::state::ow::OwState;
use crate::state::v5::Werkingsgebied;
use crate::state::{Asset, Document, WidData};

#[derive(Debug, Clone, PartialEq)]
pub struct AddPurposeAction {
    pub purpose_type: PurposeType,
    pub effective_date: Option<NaiveDate>,
    pub work_province_id: String,
    pub work_date: String,
    pub work_other: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddPublicationAction {
    pub act_frbr: Frbr,
    pub bill_frbr: Frbr,
    pub consolidation_purpose: Purpose,
    pub document_type: DocumentType,
    pub procedure_type: ProcedureType,
    pub werkingsgebieden: BTreeMap<i64, Werkingsgebied>,
    pub documents: BTreeMap<i64, Document>,
    pub assets: BTreeMap<String, Asset>,
    pub wid_data: WidData,
    pub ow_state: OwState,
    pub act_text: String,
    pub publication_version_uuid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddAnnouncementAction {
    pub doc_frbr: Frbr,
    pub about_act_frbr: Frbr,
    pub about_bill_frbr: Frbr,
    pub document_type: DocumentType,
    pub procedure_type: ProcedureType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddPurpose(AddPurposeAction),
    AddPublication(Box<AddPublicationAction>),
    AddAnnouncement(AddAnnouncementAction),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateV5;

    fn frbr(other: &str, version: u32) -> Frbr {
        Frbr {
            work_province_id: "pv28".into(),
            work_country: "nl".into(),
            work_date: "2024".into(),
            work_other: other.into(),
            expression_language: "nld".into(),
            expression_date: "2024-03-01".into(),
            expression_version: version,
        }
    }

    #[test]
    fn add_purpose_keys_by_frbr_work() {
        let mut state = StateV5::default();
        state.handle_action(Action::AddPurpose(AddPurposeAction {
            purpose_type: PurposeType::Consolidation,
            effective_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            work_province_id: "pv28".into(),
            work_date: "2024".into(),
            work_other: "instelling-omgevingsvisie-1".into(),
        }));
        let purpose = &state.purposes["/join/id/proces/pv28/2024/instelling-omgevingsvisie-1"];
        assert_eq!(purpose.effective_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn add_announcement_replaces_by_act_key() {
        let mut state = StateV5::default();
        for version in [1, 2] {
            state.handle_action(Action::AddAnnouncement(AddAnnouncementAction {
                doc_frbr: frbr("kennisgeving-1", version),
                about_act_frbr: frbr("1", 1),
                about_bill_frbr: frbr("1", 1),
                document_type: DocumentType::Programma,
                procedure_type: ProcedureType::Draft,
            }));
        }
        assert_eq!(state.announcements.len(), 1);
        let announcement = state
            .get_announcement(DocumentType::Programma, ProcedureType::Draft)
            .unwrap();
        assert_eq!(announcement.doc_frbr.expression_version, 2);
    }
}
