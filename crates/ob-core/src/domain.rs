//! # Publication Domain Enums
//!
//! Closed sets of values that select publication behaviour: what kind of
//! instrument is being published, whether the procedure is a draft or a
//! final decision, and what the consolidation purpose is.
//!
//! These strings also appear inside stored environment states (for example
//! the `"{document_type}-{procedure_type}"` act keys), so their wire forms
//! must never change.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Instrument type published through an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Omgevingsvisie,
    Programma,
    Omgevingsverordening,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Omgevingsvisie => "omgevingsvisie",
            Self::Programma => "programma",
            Self::Omgevingsverordening => "omgevingsverordening",
        }
    }
}

/// Draft (ontwerp) or final (definitief) procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureType {
    Draft,
    Final,
}

impl ProcedureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Final => "final",
        }
    }
}

/// Consolidation purpose of a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeType {
    Consolidation,
    Withdrawal,
}

impl PurposeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consolidation => "consolidation",
            Self::Withdrawal => "withdrawal",
        }
    }
}

macro_rules! str_enum_impls {
    ($ty:ident, $kind:literal, [$($variant:ident),+]) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == Self::$variant.as_str() {
                        return Ok(Self::$variant);
                    }
                )+
                Err(CoreError::UnknownVariant {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

str_enum_impls!(
    DocumentType,
    "document type",
    [Omgevingsvisie, Programma, Omgevingsverordening]
);
str_enum_impls!(ProcedureType, "procedure type", [Draft, Final]);
str_enum_impls!(PurposeType, "purpose type", [Consolidation, Withdrawal]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_type_parse_and_display() {
        assert_eq!("final".parse::<ProcedureType>().unwrap(), ProcedureType::Final);
        assert_eq!(ProcedureType::Draft.to_string(), "draft");
        assert!("ontwerp".parse::<ProcedureType>().is_err());
    }

    #[test]
    fn document_type_serde_matches_as_str() {
        for dt in [
            DocumentType::Omgevingsvisie,
            DocumentType::Programma,
            DocumentType::Omgevingsverordening,
        ] {
            let json = serde_json::to_string(&dt).unwrap();
            assert_eq!(json, format!("\"{}\"", dt.as_str()));
        }
    }

    #[test]
    fn purpose_type_unknown_value_errors() {
        let err = "repeal".parse::<PurposeType>().unwrap_err();
        assert!(err.to_string().contains("purpose type"));
    }
}
