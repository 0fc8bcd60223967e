//! # OW State
//!
//! Omgevingswet annotation objects as tracked in schema version 5. Each
//! object carries its OW identification, a lifecycle status relative to the
//! previous delivery and an optional procedure status.
//!
//! References between objects are tagged unions on `ref_type`. An
//! `unresolved_*` reference names its target by code or wId before the
//! target's OW identification is known.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwObjectStatus {
    New,
    Changed,
    #[default]
    Unchanged,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "ref_type", rename_all = "snake_case")]
pub enum LocationRef {
    Ambtsgebied {
        #[serde(rename = "ref")]
        reference: String,
    },
    UnresolvedAmbtsgebied,
    Gebied {
        target_code: String,
        #[serde(rename = "ref")]
        reference: String,
    },
    UnresolvedGebied {
        target_code: String,
    },
    Gebiedengroep {
        target_code: String,
        #[serde(rename = "ref")]
        reference: String,
    },
    UnresolvedGebiedengroep {
        target_code: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "ref_type", rename_all = "snake_case")]
pub enum WidRef {
    Divisie {
        target_wid: String,
        #[serde(rename = "ref")]
        reference: String,
    },
    UnresolvedDivisie {
        target_wid: String,
    },
    Divisietekst {
        target_wid: String,
        #[serde(rename = "ref")]
        reference: String,
    },
    UnresolvedDivisietekst {
        target_wid: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwAmbtsgebied {
    pub identification: String,
    #[serde(default)]
    pub object_status: OwObjectStatus,
    #[serde(default)]
    pub procedure_status: Option<String>,
    pub source_uuid: String,
    pub administrative_borders_id: String,
    pub domain: String,
    pub valid_on: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwRegelingsgebied {
    pub identification: String,
    #[serde(default)]
    pub object_status: OwObjectStatus,
    #[serde(default)]
    pub procedure_status: Option<String>,
    pub source_uuid: String,
    pub locatie_ref: LocationRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwGebied {
    pub identification: String,
    #[serde(default)]
    pub object_status: OwObjectStatus,
    #[serde(default)]
    pub procedure_status: Option<String>,
    pub source_uuid: String,
    pub source_code: String,
    pub title: String,
    pub geometry_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwGebiedengroep {
    pub identification: String,
    #[serde(default)]
    pub object_status: OwObjectStatus,
    #[serde(default)]
    pub procedure_status: Option<String>,
    pub source_uuid: String,
    pub source_code: String,
    pub title: String,
    #[serde(default)]
    pub gebieden_refs: Vec<LocationRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwGebiedsaanwijzing {
    pub identification: String,
    #[serde(default)]
    pub object_status: OwObjectStatus,
    #[serde(default)]
    pub procedure_status: Option<String>,
    pub source_code: String,
    pub title: String,
    pub indication_type: String,
    pub indication_group: String,
    #[serde(default)]
    pub location_refs: Vec<LocationRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwDivisie {
    pub identification: String,
    #[serde(default)]
    pub object_status: OwObjectStatus,
    #[serde(default)]
    pub procedure_status: Option<String>,
    pub source_uuid: String,
    pub source_code: String,
    pub wid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwDivisietekst {
    pub identification: String,
    #[serde(default)]
    pub object_status: OwObjectStatus,
    #[serde(default)]
    pub procedure_status: Option<String>,
    pub source_uuid: String,
    pub source_code: String,
    pub wid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwTekstdeel {
    pub identification: String,
    #[serde(default)]
    pub object_status: OwObjectStatus,
    #[serde(default)]
    pub procedure_status: Option<String>,
    pub source_uuid: String,
    pub source_code: String,
    pub idealization: String,
    pub text_ref: WidRef,
    #[serde(default)]
    pub location_refs: Vec<LocationRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwState {
    #[serde(default)]
    pub ambtsgebieden: Vec<OwAmbtsgebied>,
    #[serde(default)]
    pub regelingsgebieden: Vec<OwRegelingsgebied>,
    #[serde(default)]
    pub gebieden: Vec<OwGebied>,
    #[serde(default)]
    pub gebiedengroepen: Vec<OwGebiedengroep>,
    #[serde(default)]
    pub gebiedsaanwijzingen: Vec<OwGebiedsaanwijzing>,
    #[serde(default)]
    pub divisies: Vec<OwDivisie>,
    #[serde(default)]
    pub divisieteksten: Vec<OwDivisietekst>,
    #[serde(default)]
    pub tekstdelen: Vec<OwTekstdeel>,
}

impl OwState {
    pub fn is_empty(&self) -> bool {
        self.object_count() == 0
    }

    pub fn object_count(&self) -> usize {
        self.ambtsgebieden.len()
            + self.regelingsgebieden.len()
            + self.gebieden.len()
            + self.gebiedengroepen.len()
            + self.gebiedsaanwijzingen.len()
            + self.divisies.len()
            + self.divisieteksten.len()
            + self.tekstdelen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_ref_is_tagged_by_ref_type() {
        let r = LocationRef::Gebiedengroep {
            target_code: "werkingsgebied-3".into(),
            reference: "nl.imow-pv28.gebiedengroep.1".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["ref_type"], "gebiedengroep");
        assert_eq!(json["ref"], "nl.imow-pv28.gebiedengroep.1");

        let back: LocationRef =
            serde_json::from_str(r#"{"ref_type":"unresolved_ambtsgebied"}"#).unwrap();
        assert_eq!(back, LocationRef::UnresolvedAmbtsgebied);
    }

    #[test]
    fn object_status_defaults_to_unchanged() {
        let gebied: OwGebied = serde_json::from_str(
            r#"{"identification":"g1","source_uuid":"u","source_code":"werkingsgebied-1-0","title":"t","geometry_ref":"u"}"#,
        )
        .unwrap();
        assert_eq!(gebied.object_status, OwObjectStatus::Unchanged);
        assert_eq!(gebied.procedure_status, None);
    }

    #[test]
    fn empty_state_counts_nothing() {
        let state: OwState = serde_json::from_str("{}").unwrap();
        assert!(state.is_empty());
    }
}
