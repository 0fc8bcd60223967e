//! Version 1 → 2.
//!
//! Version 1 kept only the OW identifications, keyed by kind. Version 2
//! stores each OW object with the source data it was generated from, which
//! has to be fetched again from the publication the act was delivered with.

use std::collections::BTreeMap;
use std::sync::Arc;

use ob_core::{EnvironmentId, WorkKind};

use super::StateUpgrader;
use crate::error::PublicationError;
use crate::input::AreaOfJurisdiction;
use crate::state::v2::{BestuurlijkeGrenzenVerwijzing, LegacyOwObject, OwData};
use crate::state::{v1, v2, StateAny};

/// A werkingsgebied as it was delivered with the original publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWerkingsgebied {
    pub uuid: String,
    pub object_id: i64,
    pub code: String,
    pub title: String,
    pub hash: String,
}

/// Publication data of the package that produced a version 1 act.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPublicationData {
    pub publication_version_uuid: String,
    pub werkingsgebieden: Vec<SourceWerkingsgebied>,
    pub area_of_jurisdiction: Option<AreaOfJurisdiction>,
}

/// Looks up the publication an act expression was delivered with.
pub trait PublicationDataRepository: Send + Sync {
    fn publication_data(
        &self,
        environment: EnvironmentId,
        act: &v1::ActiveAct,
    ) -> Result<Option<LegacyPublicationData>, PublicationError>;
}

pub struct StateV2Upgrader {
    repository: Arc<dyn PublicationDataRepository>,
}

impl StateV2Upgrader {
    pub fn new(repository: Arc<dyn PublicationDataRepository>) -> Self {
        Self { repository }
    }

    fn upgrade_act(
        &self,
        environment: EnvironmentId,
        act: v1::ActiveAct,
    ) -> Result<v2::ActiveAct, PublicationError> {
        let source = self
            .repository
            .publication_data(environment, &act)?
            .ok_or_else(|| {
                PublicationError::MissingPublicationData(act.act_frbr.expression(WorkKind::Act))
            })?;

        let werkingsgebieden = act
            .werkingsgebieden
            .iter()
            .map(|(key, w)| (*key, upgrade_werkingsgebied(w, &source)))
            .collect();
        let ow_data = ow_data(&act, &source)?;

        Ok(v2::ActiveAct {
            act_frbr: act.act_frbr,
            bill_frbr: act.bill_frbr,
            consolidation_purpose: act.consolidation_purpose,
            document_type: act.document_type,
            procedure_type: act.procedure_type,
            werkingsgebieden,
            wid_data: act.wid_data,
            ow_data,
            act_text: act.act_text,
            publication_version_uuid: source.publication_version_uuid,
        })
    }
}

impl StateUpgrader for StateV2Upgrader {
    fn input_schema_version(&self) -> u32 {
        v1::SCHEMA_VERSION
    }

    fn upgrade(
        &self,
        environment: EnvironmentId,
        state: StateAny,
    ) -> Result<StateAny, PublicationError> {
        let StateAny::V1(old) = state else {
            return Err(PublicationError::UnexpectedState);
        };

        let acts = old
            .acts
            .into_iter()
            .map(|(key, act)| Ok((key, self.upgrade_act(environment, act)?)))
            .collect::<Result<BTreeMap<_, _>, PublicationError>>()?;

        Ok(StateAny::V2(v2::StateV2 {
            purposes: old.purposes,
            acts,
            announcements: old.announcements,
        }))
    }
}

fn upgrade_werkingsgebied(
    w: &v1::Werkingsgebied,
    source: &LegacyPublicationData,
) -> v2::Werkingsgebied {
    let original = source
        .werkingsgebieden
        .iter()
        .find(|s| s.object_id == w.object_id);

    v2::Werkingsgebied {
        uuid: w.uuid.clone(),
        identifier: w.identifier.clone().unwrap_or_else(|| w.uuid.clone()),
        hash: original.map(|s| s.hash.clone()).unwrap_or_default(),
        object_id: w.object_id,
        title: original.map(|s| s.title.clone()).unwrap_or_default(),
        owner_act: w.owner_act.clone(),
        frbr: w.frbr.clone(),
    }
}

fn entries<'a>(
    ids: &'a BTreeMap<String, BTreeMap<String, String>>,
    kind: &str,
) -> impl Iterator<Item = (&'a String, &'a String)> + 'a {
    ids.get(kind).into_iter().flatten()
}

fn ow_data(act: &v1::ActiveAct, source: &LegacyPublicationData) -> Result<OwData, PublicationError> {
    let ids = &act.ow_data.object_map.id_mapping;
    let by_code = |code: &str| source.werkingsgebieden.iter().find(|w| w.code == code);

    let mut objects: BTreeMap<String, LegacyOwObject> = BTreeMap::new();

    for (aoj_uuid, ow_id) in entries(ids, "ambtsgebied") {
        let aoj = source
            .area_of_jurisdiction
            .as_ref()
            .filter(|a| a.uuid.to_string() == *aoj_uuid)
            .ok_or(PublicationError::AreaOfJurisdictionMismatch)?;
        objects.insert(
            ow_id.clone(),
            LegacyOwObject {
                ow_id: ow_id.clone(),
                ow_type: Some("OWAmbtsgebied".into()),
                mapped_uuid: Some(aoj.uuid.to_string()),
                noemer: Some(aoj.title.clone()),
                bestuurlijke_grenzen_verwijzing: Some(BestuurlijkeGrenzenVerwijzing {
                    bestuurlijke_grenzen_id: aoj.administrative_borders_id.clone(),
                    domein: aoj.administrative_borders_domain.clone(),
                    geldig_op: aoj.administrative_borders_date.clone(),
                }),
                ..Default::default()
            },
        );
    }

    for (aoj_ow_id, ow_id) in entries(ids, "regelingsgebied") {
        objects.insert(
            ow_id.clone(),
            LegacyOwObject {
                ow_id: ow_id.clone(),
                ow_type: Some("OWRegelingsgebied".into()),
                ambtsgebied: Some(aoj_ow_id.clone()),
                ..Default::default()
            },
        );
    }

    for (code, ow_id) in entries(ids, "gebieden") {
        let original = by_code(code.as_str());
        objects.insert(
            ow_id.clone(),
            LegacyOwObject {
                ow_id: ow_id.clone(),
                ow_type: Some("OWGebied".into()),
                mapped_uuid: original.map(|w| w.uuid.clone()),
                noemer: Some(original.map(|w| w.title.clone()).unwrap_or_default()),
                mapped_geo_code: Some(code.clone()),
                ..Default::default()
            },
        );
    }

    for (code, ow_id) in entries(ids, "gebiedengroep") {
        let original = by_code(code.as_str());
        let gebied = ids.get("gebieden").and_then(|g| g.get(code));
        objects.insert(
            ow_id.clone(),
            LegacyOwObject {
                ow_id: ow_id.clone(),
                ow_type: Some("OWGebiedenGroep".into()),
                mapped_uuid: original.map(|w| w.uuid.clone()),
                noemer: Some(original.map(|w| w.title.clone()).unwrap_or_default()),
                mapped_geo_code: Some(code.clone()),
                gebieden: Some(gebied.into_iter().cloned().collect()),
                ..Default::default()
            },
        );
    }

    for (wid, ow_id) in entries(ids, "wid") {
        let object_code = act
            .wid_data
            .known_wid_map
            .iter()
            .find(|(_, known)| *known == wid)
            .map(|(code, _)| code.clone());
        objects.insert(
            ow_id.clone(),
            LegacyOwObject {
                ow_id: ow_id.clone(),
                ow_type: Some("OWDivisieTekst".into()),
                wid: Some(wid.clone()),
                mapped_policy_object_code: object_code,
                ..Default::default()
            },
        );
    }

    for (ow_id, data) in &act.ow_data.object_map.tekstdeel_mapping {
        let field = |name: &str| {
            data.get(name).cloned().ok_or_else(|| PublicationError::MalformedOwObject {
                ow_id: ow_id.clone(),
                reason: format!("tekstdeel mapping has no {name}"),
            })
        };
        objects.insert(
            ow_id.clone(),
            LegacyOwObject {
                ow_id: ow_id.clone(),
                ow_type: Some("OWTekstdeel".into()),
                divisie: Some(field("divisie")?),
                locaties: Some(vec![field("location")?]),
                divisie_type: Some("divisietekst".into()),
                ..Default::default()
            },
        );
    }

    Ok(OwData {
        ow_objects: objects,
        terminated_ow_ids: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{frbr, purpose};
    use ob_core::{DocumentType, ProcedureType};
    use uuid::Uuid;

    const AOJ_UUID: &str = "5d8b3a40-6a42-4f1c-9a0e-2f7d1c3b4a50";

    struct FixedRepository(Option<LegacyPublicationData>);

    impl PublicationDataRepository for FixedRepository {
        fn publication_data(
            &self,
            _environment: EnvironmentId,
            _act: &v1::ActiveAct,
        ) -> Result<Option<LegacyPublicationData>, PublicationError> {
            Ok(self.0.clone())
        }
    }

    fn source() -> LegacyPublicationData {
        LegacyPublicationData {
            publication_version_uuid: "11111111-2222-3333-4444-555555555555".into(),
            werkingsgebieden: vec![SourceWerkingsgebied {
                uuid: "wg-uuid".into(),
                object_id: 3,
                code: "werkingsgebied-3".into(),
                title: "Bodem".into(),
                hash: "abc".into(),
            }],
            area_of_jurisdiction: Some(AreaOfJurisdiction {
                uuid: Uuid::parse_str(AOJ_UUID).unwrap(),
                title: "Provincie".into(),
                administrative_borders_id: "PV28".into(),
                administrative_borders_domain: "NL.BI.BestuurlijkGebied".into(),
                administrative_borders_date: "2023-01-01".into(),
            }),
        }
    }

    fn mapping(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn v1_state(aoj_uuid: &str) -> v1::StateV1 {
        let mut id_mapping = BTreeMap::new();
        id_mapping.insert("ambtsgebied".to_string(), mapping(&[(aoj_uuid, "ow-ambt")]));
        id_mapping.insert("regelingsgebied".to_string(), mapping(&[("ow-ambt", "ow-regeling")]));
        id_mapping.insert("gebieden".to_string(), mapping(&[("werkingsgebied-3", "ow-gebied")]));
        id_mapping.insert("gebiedengroep".to_string(), mapping(&[("werkingsgebied-3", "ow-groep")]));
        id_mapping.insert("wid".to_string(), mapping(&[("pv28__div_1", "ow-divisietekst")]));

        let mut tekstdeel_mapping = BTreeMap::new();
        tekstdeel_mapping.insert(
            "ow-tekstdeel".to_string(),
            mapping(&[("divisie", "ow-divisietekst"), ("location", "ow-groep")]),
        );

        let act = v1::ActiveAct {
            act_frbr: frbr("2_1", 1),
            bill_frbr: frbr("2_1", 1),
            consolidation_purpose: purpose(),
            document_type: DocumentType::Omgevingsvisie,
            procedure_type: ProcedureType::Final,
            werkingsgebieden: [(
                3,
                v1::Werkingsgebied {
                    uuid: "wg-uuid".into(),
                    identifier: None,
                    object_id: 3,
                    owner_act: "/akn/nl/act/pv28/2024/2_1".into(),
                    frbr: frbr("2-1-3", 1),
                },
            )]
            .into(),
            wid_data: crate::state::WidData {
                known_wid_map: mapping(&[("beleidskeuze-1", "pv28__div_1")]),
                known_wids: vec!["pv28__div_1".into()],
            },
            ow_data: v1::OwData {
                object_map: v1::OwObjectMap {
                    id_mapping,
                    tekstdeel_mapping,
                },
            },
            act_text: "<RegelingVrijetekst/>".into(),
        };

        v1::StateV1 {
            acts: [("omgevingsvisie-final".to_string(), act)].into(),
            ..Default::default()
        }
    }

    fn upgrade(state: v1::StateV1, data: Option<LegacyPublicationData>) -> Result<v2::StateV2, PublicationError> {
        let upgrader = StateV2Upgrader::new(Arc::new(FixedRepository(data)));
        match upgrader.upgrade(EnvironmentId::new(), StateAny::V1(state))? {
            StateAny::V2(s) => Ok(s),
            other => panic!("unexpected version {}", other.schema_version()),
        }
    }

    #[test]
    fn werkingsgebied_takes_title_and_hash_from_source() {
        let state = upgrade(v1_state(AOJ_UUID), Some(source())).unwrap();
        let act = &state.acts["omgevingsvisie-final"];
        let w = &act.werkingsgebieden[&3];
        assert_eq!(w.title, "Bodem");
        assert_eq!(w.hash, "abc");
        assert_eq!(w.identifier, "wg-uuid");
        assert_eq!(act.publication_version_uuid, "11111111-2222-3333-4444-555555555555");
    }

    #[test]
    fn ow_objects_are_typed() {
        let state = upgrade(v1_state(AOJ_UUID), Some(source())).unwrap();
        let objects = &state.acts["omgevingsvisie-final"].ow_data.ow_objects;
        assert_eq!(objects.len(), 6);

        let ambt = &objects["ow-ambt"];
        assert_eq!(ambt.ow_type.as_deref(), Some("OWAmbtsgebied"));
        assert_eq!(
            ambt.bestuurlijke_grenzen_verwijzing.as_ref().map(|b| b.geldig_op.as_str()),
            Some("2023-01-01")
        );
        assert_eq!(objects["ow-regeling"].ambtsgebied.as_deref(), Some("ow-ambt"));
        assert_eq!(objects["ow-groep"].gebieden, Some(vec!["ow-gebied".to_string()]));
        assert_eq!(
            objects["ow-divisietekst"].mapped_policy_object_code.as_deref(),
            Some("beleidskeuze-1")
        );
        let tekstdeel = &objects["ow-tekstdeel"];
        assert_eq!(tekstdeel.divisie.as_deref(), Some("ow-divisietekst"));
        assert_eq!(tekstdeel.locaties, Some(vec!["ow-groep".to_string()]));
    }

    #[test]
    fn aoj_mismatch_is_rejected() {
        let result = upgrade(v1_state("00000000-0000-0000-0000-000000000001"), Some(source()));
        assert!(matches!(result, Err(PublicationError::AreaOfJurisdictionMismatch)));
    }

    #[test]
    fn missing_publication_data_is_rejected() {
        let result = upgrade(v1_state(AOJ_UUID), None);
        assert!(matches!(result, Err(PublicationError::MissingPublicationData(_))));
    }

    #[test]
    fn other_versions_are_rejected() {
        let upgrader = StateV2Upgrader::new(Arc::new(FixedRepository(None)));
        let result = upgrader.upgrade(EnvironmentId::new(), StateAny::V2(Default::default()));
        assert!(matches!(result, Err(PublicationError::UnexpectedState)));
    }
}
