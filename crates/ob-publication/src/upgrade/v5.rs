//! Version 4 → 5: the loosely typed OW objects become a typed [`OwState`].
//!
//! All converted objects are `unchanged`; they describe what was already
//! delivered. Cross references (regelingsgebied → ambtsgebied, tekstdeel →
//! divisietekst and gebiedengroep) are resolved against the other objects
//! of the same act.

use std::collections::BTreeMap;

use ob_core::{EnvironmentId, ProcedureType};

use super::StateUpgrader;
use crate::error::PublicationError;
use crate::state::ow::{
    LocationRef, OwAmbtsgebied, OwDivisietekst, OwGebied, OwGebiedengroep, OwObjectStatus,
    OwRegelingsgebied, OwState, OwTekstdeel, WidRef,
};
use crate::state::v2::LegacyOwObject;
use crate::state::{v4, v5, StateAny};

pub const INDICATIVE_IDEALIZATION: &str =
    "http://standaarden.omgevingswet.overheid.nl/idealisatie/id/concept/Indicatief";

pub struct StateV5Upgrader;

impl StateUpgrader for StateV5Upgrader {
    fn input_schema_version(&self) -> u32 {
        v4::SCHEMA_VERSION
    }

    fn upgrade(
        &self,
        _environment: EnvironmentId,
        state: StateAny,
    ) -> Result<StateAny, PublicationError> {
        let StateAny::V4(old) = state else {
            return Err(PublicationError::UnexpectedState);
        };

        let acts = old
            .acts
            .into_iter()
            .map(|(key, act)| Ok((key, upgrade_act(act)?)))
            .collect::<Result<BTreeMap<_, _>, PublicationError>>()?;

        Ok(StateAny::V5(v5::StateV5 {
            purposes: old.purposes,
            acts,
            announcements: old.announcements,
        }))
    }
}

fn upgrade_act(act: v4::ActiveAct) -> Result<v5::ActiveAct, PublicationError> {
    let ow_state = ow_state(&act.ow_data.ow_objects, act.procedure_type)?;
    let werkingsgebieden = act
        .werkingsgebieden
        .into_iter()
        .map(|(object_id, w)| {
            let w = v5::Werkingsgebied {
                uuid: w.uuid,
                identifier: w.identifier,
                hash: w.hash,
                object_id: w.object_id,
                title: w.title,
                owner_act: w.owner_act,
                frbr: w.frbr,
                locations: w.locations,
            };
            (object_id, w)
        })
        .collect();

    Ok(v5::ActiveAct {
        act_frbr: act.act_frbr,
        bill_frbr: act.bill_frbr,
        consolidation_purpose: act.consolidation_purpose,
        document_type: act.document_type,
        procedure_type: act.procedure_type,
        werkingsgebieden,
        documents: act.documents,
        assets: act.assets,
        wid_data: act.wid_data,
        ow_state,
        act_text: act.act_text,
        publication_version_uuid: act.publication_version_uuid,
    })
}

fn required<'a, T: ?Sized>(
    object: &LegacyOwObject,
    field: &str,
    value: Option<&'a T>,
) -> Result<&'a T, PublicationError> {
    value.ok_or_else(|| PublicationError::MalformedOwObject {
        ow_id: object.ow_id.clone(),
        reason: format!("missing {field}"),
    })
}

fn referenced<'a>(
    objects: &'a BTreeMap<String, LegacyOwObject>,
    from: &LegacyOwObject,
    ow_id: &str,
) -> Result<&'a LegacyOwObject, PublicationError> {
    objects
        .get(ow_id)
        .ok_or_else(|| PublicationError::MalformedOwObject {
            ow_id: from.ow_id.clone(),
            reason: format!("references unknown object {ow_id}"),
        })
}

fn ow_state(
    objects: &BTreeMap<String, LegacyOwObject>,
    procedure_type: ProcedureType,
) -> Result<OwState, PublicationError> {
    let mut state = OwState::default();
    let unchanged = OwObjectStatus::Unchanged;

    for o in objects.values() {
        let ow_type = o.ow_type.as_deref().unwrap_or_default();
        match ow_type {
            "OWAmbtsgebied" => {
                let borders = required(
                    o,
                    "bestuurlijke_grenzen_verwijzing",
                    o.bestuurlijke_grenzen_verwijzing.as_ref(),
                )?;
                state.ambtsgebieden.push(OwAmbtsgebied {
                    identification: o.ow_id.clone(),
                    object_status: unchanged,
                    procedure_status: o.procedure_status.clone(),
                    source_uuid: required(o, "mapped_uuid", o.mapped_uuid.as_deref())?.to_string(),
                    administrative_borders_id: borders.bestuurlijke_grenzen_id.clone(),
                    domain: borders.domein.clone(),
                    valid_on: borders.geldig_op.clone(),
                    title: String::new(),
                });
            }
            "OWRegelingsgebied" => {
                let ambtsgebied = required(o, "ambtsgebied", o.ambtsgebied.as_deref())?;
                let target = referenced(objects, o, ambtsgebied)?;
                state.regelingsgebieden.push(OwRegelingsgebied {
                    identification: o.ow_id.clone(),
                    object_status: unchanged,
                    procedure_status: o.procedure_status.clone(),
                    source_uuid: target.mapped_uuid.clone().unwrap_or_default(),
                    locatie_ref: LocationRef::Ambtsgebied {
                        reference: ambtsgebied.to_string(),
                    },
                });
            }
            "OWGebied" => {
                let gio_ref = gio_ref(o)?;
                let geo_code = required(o, "mapped_geo_code", o.mapped_geo_code.as_deref())?;
                state.gebieden.push(OwGebied {
                    identification: o.ow_id.clone(),
                    object_status: unchanged,
                    procedure_status: o.procedure_status.clone(),
                    source_uuid: gio_ref.clone(),
                    source_code: format!("{geo_code}-0"),
                    title: o.noemer.clone().unwrap_or_default(),
                    geometry_ref: gio_ref,
                });
            }
            "OWGebiedenGroep" => {
                let geo_code = required(o, "mapped_geo_code", o.mapped_geo_code.as_deref())?;
                let gebied = required(o, "gebieden", o.gebieden.as_ref().and_then(|g| g.first()))?;
                state.gebiedengroepen.push(OwGebiedengroep {
                    identification: o.ow_id.clone(),
                    object_status: unchanged,
                    procedure_status: o.procedure_status.clone(),
                    source_uuid: gio_ref(o)?,
                    source_code: geo_code.to_string(),
                    title: o.noemer.clone().unwrap_or_default(),
                    gebieden_refs: vec![LocationRef::Gebied {
                        target_code: format!("{geo_code}-0"),
                        reference: gebied.clone(),
                    }],
                });
            }
            "OWDivisieTekst" => {
                state.divisieteksten.push(OwDivisietekst {
                    identification: o.ow_id.clone(),
                    object_status: unchanged,
                    procedure_status: o.procedure_status.clone(),
                    source_uuid: String::new(),
                    source_code: o.mapped_policy_object_code.clone().unwrap_or_default(),
                    wid: required(o, "wid", o.wid.as_deref())?.to_string(),
                });
            }
            "OWTekstdeel" => {
                let divisie_id = required(o, "divisie", o.divisie.as_deref())?;
                let divisie = referenced(objects, o, divisie_id)?;
                let location_refs = o
                    .locaties
                    .iter()
                    .flatten()
                    .map(|l| -> Result<LocationRef, PublicationError> {
                        if l.contains("ambtsgebied") {
                            return Ok(LocationRef::Ambtsgebied { reference: l.clone() });
                        }
                        let groep = referenced(objects, o, l)?;
                        let target_code =
                            required(groep, "mapped_geo_code", groep.mapped_geo_code.as_deref())?;
                        Ok(LocationRef::Gebiedengroep {
                            target_code: target_code.to_string(),
                            reference: l.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                state.tekstdelen.push(OwTekstdeel {
                    identification: o.ow_id.clone(),
                    object_status: unchanged,
                    procedure_status: o.procedure_status.clone(),
                    source_uuid: String::new(),
                    source_code: divisie.mapped_policy_object_code.clone().unwrap_or_default(),
                    idealization: INDICATIVE_IDEALIZATION.to_string(),
                    text_ref: WidRef::Divisietekst {
                        target_wid: required(divisie, "wid", divisie.wid.as_deref())?.to_string(),
                        reference: divisie_id.to_string(),
                    },
                    location_refs,
                });
            }
            // Drafts are never amended, so an unreadable draft OW state is dropped.
            _ if procedure_type == ProcedureType::Draft => return Ok(OwState::default()),
            other => return Err(PublicationError::UnknownOwType(other.to_string())),
        }
    }

    Ok(state)
}

fn gio_ref(o: &LegacyOwObject) -> Result<String, PublicationError> {
    let value = o.gio_ref.as_deref().or(o.mapped_uuid.as_deref());
    required(o, "gio_ref", value).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::v2::BestuurlijkeGrenzenVerwijzing;

    fn object(ow_id: &str, ow_type: &str) -> LegacyOwObject {
        LegacyOwObject {
            ow_id: ow_id.into(),
            ow_type: Some(ow_type.into()),
            ..Default::default()
        }
    }

    fn legacy_objects() -> BTreeMap<String, LegacyOwObject> {
        let ambt = LegacyOwObject {
            mapped_uuid: Some("aoj-uuid".into()),
            bestuurlijke_grenzen_verwijzing: Some(BestuurlijkeGrenzenVerwijzing {
                bestuurlijke_grenzen_id: "PV28".into(),
                domein: "NL.BI.BestuurlijkGebied".into(),
                geldig_op: "2023-01-01".into(),
            }),
            ..object("nl.imow-pv28.ambtsgebied.1", "OWAmbtsgebied")
        };
        let regeling = LegacyOwObject {
            ambtsgebied: Some("nl.imow-pv28.ambtsgebied.1".into()),
            ..object("nl.imow-pv28.regelingsgebied.1", "OWRegelingsgebied")
        };
        let gebied = LegacyOwObject {
            mapped_uuid: Some("wg-uuid".into()),
            mapped_geo_code: Some("werkingsgebied-3".into()),
            noemer: Some("Bodem".into()),
            ..object("nl.imow-pv28.gebied.1", "OWGebied")
        };
        let groep = LegacyOwObject {
            mapped_uuid: Some("wg-uuid".into()),
            mapped_geo_code: Some("werkingsgebied-3".into()),
            noemer: Some("Bodem".into()),
            gebieden: Some(vec!["nl.imow-pv28.gebied.1".into()]),
            ..object("nl.imow-pv28.gebiedengroep.1", "OWGebiedenGroep")
        };
        let divisietekst = LegacyOwObject {
            wid: Some("pv28__div_1".into()),
            mapped_policy_object_code: Some("beleidskeuze-1".into()),
            ..object("nl.imow-pv28.divisietekst.1", "OWDivisieTekst")
        };
        let tekstdeel = LegacyOwObject {
            divisie: Some("nl.imow-pv28.divisietekst.1".into()),
            locaties: Some(vec![
                "nl.imow-pv28.gebiedengroep.1".into(),
                "nl.imow-pv28.ambtsgebied.1".into(),
            ]),
            divisie_type: Some("divisietekst".into()),
            ..object("nl.imow-pv28.tekstdeel.1", "OWTekstdeel")
        };

        [ambt, regeling, gebied, groep, divisietekst, tekstdeel]
            .into_iter()
            .map(|o| (o.ow_id.clone(), o))
            .collect()
    }

    #[test]
    fn every_object_kind_is_converted() {
        let state = ow_state(&legacy_objects(), ProcedureType::Final).unwrap();
        assert_eq!(state.object_count(), 6);

        assert_eq!(state.regelingsgebieden[0].source_uuid, "aoj-uuid");
        assert_eq!(state.gebieden[0].source_code, "werkingsgebied-3-0");
        assert_eq!(state.gebieden[0].geometry_ref, "wg-uuid");
        assert_eq!(
            state.gebiedengroepen[0].gebieden_refs,
            vec![LocationRef::Gebied {
                target_code: "werkingsgebied-3-0".into(),
                reference: "nl.imow-pv28.gebied.1".into(),
            }]
        );

        let tekstdeel = &state.tekstdelen[0];
        assert_eq!(tekstdeel.source_code, "beleidskeuze-1");
        assert_eq!(tekstdeel.idealization, INDICATIVE_IDEALIZATION);
        assert_eq!(
            tekstdeel.text_ref,
            WidRef::Divisietekst {
                target_wid: "pv28__div_1".into(),
                reference: "nl.imow-pv28.divisietekst.1".into(),
            }
        );
        assert!(matches!(
            &tekstdeel.location_refs[..],
            [LocationRef::Gebiedengroep { target_code, .. }, LocationRef::Ambtsgebied { .. }]
                if target_code == "werkingsgebied-3"
        ));
        assert!(state
            .ambtsgebieden
            .iter()
            .all(|a| a.object_status == OwObjectStatus::Unchanged && a.title.is_empty()));
    }

    #[test]
    fn gio_ref_wins_over_mapped_uuid() {
        let mut objects = legacy_objects();
        if let Some(gebied) = objects.get_mut("nl.imow-pv28.gebied.1") {
            gebied.gio_ref = Some("gio-ref".into());
        }
        let state = ow_state(&objects, ProcedureType::Final).unwrap();
        assert_eq!(state.gebieden[0].geometry_ref, "gio-ref");
    }

    #[test]
    fn unknown_type_fails_final_act() {
        let mut objects = legacy_objects();
        objects.insert("x".into(), object("x", "OWMysterie"));
        assert!(matches!(
            ow_state(&objects, ProcedureType::Final),
            Err(PublicationError::UnknownOwType(t)) if t == "OWMysterie"
        ));
    }

    #[test]
    fn unknown_type_empties_draft_act() {
        let mut objects = legacy_objects();
        objects.insert("x".into(), object("x", "OWMysterie"));
        assert!(ow_state(&objects, ProcedureType::Draft).unwrap().is_empty());
    }

    #[test]
    fn dangling_reference_is_malformed() {
        let mut objects = legacy_objects();
        objects.remove("nl.imow-pv28.divisietekst.1");
        assert!(matches!(
            ow_state(&objects, ProcedureType::Final),
            Err(PublicationError::MalformedOwObject { ow_id, .. }) if ow_id == "nl.imow-pv28.tekstdeel.1"
        ));
    }

    #[test]
    fn other_versions_are_rejected() {
        let result = StateV5Upgrader.upgrade(EnvironmentId::new(), StateAny::V5(Default::default()));
        assert!(matches!(result, Err(PublicationError::UnexpectedState)));
    }
}
