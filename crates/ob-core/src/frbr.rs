//! # FRBR Identifiers
//!
//! STOP/TPOD cite every published instrument with an FRBR work and
//! expression. The work identifies the legal object for its whole life; the
//! expression identifies one version of its content.
//!
//! ```text
//! /akn/nl/act/pv28/2024/2_1           work
//! /akn/nl/act/pv28/2024/2_1/nld@2024-05-01;3   expression
//! ```
//!
//! ## Stability Rules
//!
//! - A legal object keeps its work (`work_province_id`, `work_date`,
//!   `work_other`) across amendments.
//! - `expression_version` increments only when the content changes.
//!   Unchanged objects republish the exact previous expression.

use serde::{Deserialize, Serialize};

use crate::domain::PurposeType;

/// Kind of document an FRBR work path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKind {
    /// Consolidated regulation (`/akn/{country}/act/...`).
    Act,
    /// Amending decision (`/akn/{country}/bill/...`).
    Bill,
    /// Announcement (`/akn/{country}/doc/...`).
    Doc,
    /// Geographic information object (`/join/id/regdata/...`).
    Gio,
    /// Attached file (`/join/id/regdata/...`).
    File,
}

/// The seven FRBR fields as stored in environment states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frbr {
    #[serde(rename = "Work_Province_ID")]
    pub work_province_id: String,
    #[serde(rename = "Work_Country")]
    pub work_country: String,
    #[serde(rename = "Work_Date")]
    pub work_date: String,
    #[serde(rename = "Work_Other")]
    pub work_other: String,
    #[serde(rename = "Expression_Language")]
    pub expression_language: String,
    #[serde(rename = "Expression_Date")]
    pub expression_date: String,
    #[serde(rename = "Expression_Version")]
    pub expression_version: u32,
}

impl Frbr {
    /// Render the work path for the given document kind.
    pub fn work(&self, kind: WorkKind) -> String {
        let Self {
            work_province_id: prov,
            work_country: country,
            work_date: date,
            work_other: other,
            ..
        } = self;
        match kind {
            WorkKind::Act => format!("/akn/{country}/act/{prov}/{date}/{other}"),
            WorkKind::Bill => format!("/akn/{country}/bill/{prov}/{date}/{other}"),
            WorkKind::Doc => format!("/akn/{country}/doc/{prov}/{date}/{other}"),
            WorkKind::Gio | WorkKind::File => format!("/join/id/regdata/{prov}/{date}/{other}"),
        }
    }

    /// `"{language}@{date};{version}"`.
    pub fn expression_version_str(&self) -> String {
        format!(
            "{}@{};{}",
            self.expression_language, self.expression_date, self.expression_version
        )
    }

    /// Full expression path: work followed by the expression suffix.
    pub fn expression(&self, kind: WorkKind) -> String {
        format!("{}/{}", self.work(kind), self.expression_version_str())
    }

    /// Whether `other` identifies the same work.
    pub fn same_work(&self, other: &Frbr) -> bool {
        self.work_province_id == other.work_province_id
            && self.work_date == other.work_date
            && self.work_other == other.work_other
    }

    /// Copy of this FRBR with the same work and the next expression version.
    pub fn next_expression(&self, expression_date: impl Into<String>) -> Self {
        Self {
            expression_date: expression_date.into(),
            expression_version: self.expression_version + 1,
            ..self.clone()
        }
    }
}

/// Act FRBR together with the internal act id it was minted for.
///
/// The act id is embedded in the `work_other` of every werkingsgebied and
/// document published under the act. A consolidated act reconstructed from
/// state carries act id `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActFrbr {
    #[serde(rename = "Act_ID")]
    pub act_id: i64,
    #[serde(flatten)]
    pub frbr: Frbr,
}

impl ActFrbr {
    pub fn work(&self) -> String {
        self.frbr.work(WorkKind::Act)
    }

    pub fn expression(&self) -> String {
        self.frbr.expression(WorkKind::Act)
    }
}

/// Consolidation purpose ("doel") as stored in environment states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purpose {
    #[serde(rename = "Purpose_Type")]
    pub purpose_type: PurposeType,
    #[serde(rename = "Effective_Date", default)]
    pub effective_date: Option<String>,
    #[serde(rename = "Work_Province_ID")]
    pub work_province_id: String,
    #[serde(rename = "Work_Date")]
    pub work_date: String,
    #[serde(rename = "Work_Other")]
    pub work_other: String,
}

impl Purpose {
    /// `/join/id/proces/{province}/{date}/{other}`; the key purposes are
    /// stored under.
    pub fn frbr_work(&self) -> String {
        format!(
            "/join/id/proces/{}/{}/{}",
            self.work_province_id, self.work_date, self.work_other
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frbr {
        Frbr {
            work_province_id: "pv28".to_string(),
            work_country: "nl".to_string(),
            work_date: "2024".to_string(),
            work_other: "2_1".to_string(),
            expression_language: "nld".to_string(),
            expression_date: "2024-05-01".to_string(),
            expression_version: 3,
        }
    }

    #[test]
    fn work_paths_per_kind() {
        let f = sample();
        assert_eq!(f.work(WorkKind::Act), "/akn/nl/act/pv28/2024/2_1");
        assert_eq!(f.work(WorkKind::Bill), "/akn/nl/bill/pv28/2024/2_1");
        assert_eq!(f.work(WorkKind::Doc), "/akn/nl/doc/pv28/2024/2_1");
        assert_eq!(f.work(WorkKind::Gio), "/join/id/regdata/pv28/2024/2_1");
    }

    #[test]
    fn expression_suffix() {
        let f = sample();
        assert_eq!(f.expression_version_str(), "nld@2024-05-01;3");
        assert_eq!(
            f.expression(WorkKind::Act),
            "/akn/nl/act/pv28/2024/2_1/nld@2024-05-01;3"
        );
    }

    #[test]
    fn next_expression_keeps_work() {
        let f = sample();
        let next = f.next_expression("2024-06-01");
        assert!(next.same_work(&f));
        assert_eq!(next.expression_version, 4);
        assert_eq!(next.expression_date, "2024-06-01");
    }

    #[test]
    fn stored_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["Work_Province_ID"], "pv28");
        assert_eq!(json["Expression_Version"], 3);
    }

    #[test]
    fn act_frbr_flattens_fields() {
        let act = ActFrbr {
            act_id: 2,
            frbr: sample(),
        };
        let json = serde_json::to_value(&act).unwrap();
        assert_eq!(json["Act_ID"], 2);
        assert_eq!(json["Work_Other"], "2_1");
        let back: ActFrbr = serde_json::from_value(json).unwrap();
        assert_eq!(back, act);
    }

    #[test]
    fn purpose_work() {
        let purpose = Purpose {
            purpose_type: PurposeType::Consolidation,
            effective_date: None,
            work_province_id: "pv28".to_string(),
            work_date: "2024".to_string(),
            work_other: "instelling-2-3".to_string(),
        };
        assert_eq!(purpose.frbr_work(), "/join/id/proces/pv28/2024/instelling-2-3");
        let json = serde_json::to_value(&purpose).unwrap();
        assert_eq!(json["Purpose_Type"], "consolidation");
    }
}
