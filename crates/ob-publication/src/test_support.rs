//! Fixtures shared by the unit tests of this crate.

use uuid::Uuid;

use ob_core::{ActFrbr, DocumentType, Frbr, ProcedureType, Purpose, PurposeType};
use ob_state::PackageType;

use crate::input::{ActInputData, PublicationData, PublicationObject};
use crate::state::ow::OwState;
use crate::state::v5::ActiveAct;
use crate::state::WidData;

pub fn frbr(work_other: &str, version: u32) -> Frbr {
    Frbr {
        work_province_id: "pv28".into(),
        work_country: "nl".into(),
        work_date: "2024".into(),
        work_other: work_other.into(),
        expression_language: "nld".into(),
        expression_date: "2024-03-01".into(),
        expression_version: version,
    }
}

pub fn purpose() -> Purpose {
    Purpose {
        purpose_type: PurposeType::Consolidation,
        effective_date: None,
        work_province_id: "pv28".into(),
        work_date: "2024".into(),
        work_other: "instelling-2_1-1".into(),
    }
}

pub fn publication_object(code: &str, object_id: i64) -> PublicationObject {
    let object_type = code.rsplit_once('-').map_or(code, |(t, _)| t);
    PublicationObject {
        uuid: Uuid::new_v4(),
        code: code.into(),
        object_type: object_type.into(),
        object_id,
        title: format!("Titel {code}"),
        text: String::new(),
        werkingsgebied_code: None,
        documents: vec![],
        assets: vec![],
        area: None,
        file: None,
    }
}

pub fn act_input() -> ActInputData {
    ActInputData {
        bill_frbr: frbr("2_1", 1),
        act_frbr: ActFrbr {
            act_id: 2,
            frbr: frbr("2_1", 1),
        },
        consolidation_purpose: purpose(),
        publication_data: PublicationData::default(),
        package_type: PackageType::Publication,
        document_type: DocumentType::Omgevingsvisie,
        procedure_type: ProcedureType::Final,
        publication_version_uuid: Uuid::new_v4(),
        province_id: "pv28".into(),
        act_mutation: None,
        ow_state: None,
    }
}

pub fn active_act() -> ActiveAct {
    ActiveAct {
        act_frbr: frbr("1", 3),
        bill_frbr: frbr("1", 3),
        consolidation_purpose: purpose(),
        document_type: DocumentType::Omgevingsvisie,
        procedure_type: ProcedureType::Final,
        werkingsgebieden: Default::default(),
        documents: Default::default(),
        assets: Default::default(),
        wid_data: WidData::default(),
        ow_state: OwState::default(),
        act_text: "<RegelingVrijetekst/>".into(),
        publication_version_uuid: Uuid::new_v4().to_string(),
    }
}
