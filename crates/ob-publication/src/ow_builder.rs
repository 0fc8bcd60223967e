//! # OW Delta
//!
//! Derives the OW objects of a new package from its input and compares
//! them with the OW state of the consolidated act. Objects are matched on
//! their source key:
//!
//! | object | key |
//! |---|---|
//! | ambtsgebied, regelingsgebied | area of jurisdiction uuid |
//! | gebied | `{werkingsgebied code}-{location index}` |
//! | gebiedengroep | werkingsgebied code |
//! | divisietekst | wId |
//! | tekstdeel | policy object code |
//!
//! A matched object keeps its identification and is `unchanged` or
//! `changed`; an unmatched one gets a fresh identification and is `new`.
//! Previous objects without a match are terminated.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::act_text::used_objects;
use crate::input::ActInputData;
use crate::state::ow::{
    LocationRef, OwAmbtsgebied, OwDivisietekst, OwGebied, OwGebiedengroep, OwObjectStatus,
    OwRegelingsgebied, OwState, OwTekstdeel, WidRef,
};
use crate::upgrade::v5::INDICATIVE_IDEALIZATION;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwDelta {
    /// OW state after the package is accepted.
    pub state: OwState,
    /// Identifications of previous objects that are no longer produced.
    pub terminated: Vec<String>,
}

impl OwDelta {
    pub fn has_changes(&self) -> bool {
        !self.terminated.is_empty() || self.changed_count() > 0
    }

    /// Number of `new` or `changed` objects.
    pub fn changed_count(&self) -> usize {
        let s = &self.state;
        let statuses = s
            .ambtsgebieden
            .iter()
            .map(|o| o.object_status)
            .chain(s.regelingsgebieden.iter().map(|o| o.object_status))
            .chain(s.gebieden.iter().map(|o| o.object_status))
            .chain(s.gebiedengroepen.iter().map(|o| o.object_status))
            .chain(s.divisieteksten.iter().map(|o| o.object_status))
            .chain(s.tekstdelen.iter().map(|o| o.object_status));
        statuses
            .filter(|st| matches!(st, OwObjectStatus::New | OwObjectStatus::Changed))
            .count()
    }
}

struct Minter<'a> {
    province_id: &'a str,
}

impl Minter<'_> {
    fn mint(&self, kind: &str) -> String {
        format!("nl.imow-{}.{kind}.{}", self.province_id, Uuid::new_v4().simple())
    }

    /// Identification and status for an object matched against `previous`.
    fn resolve<T>(
        &self,
        kind: &str,
        previous: Option<&T>,
        identification: impl Fn(&T) -> &str,
        unchanged: impl Fn(&T) -> bool,
    ) -> (String, OwObjectStatus) {
        match previous {
            None => (self.mint(kind), OwObjectStatus::New),
            Some(p) if unchanged(p) => (identification(p).to_string(), OwObjectStatus::Unchanged),
            Some(p) => (identification(p).to_string(), OwObjectStatus::Changed),
        }
    }
}

pub fn build_ow_delta(data: &ActInputData, wid_map: &BTreeMap<String, String>) -> OwDelta {
    let empty = OwState::default();
    let previous = data.ow_state.as_ref().unwrap_or(&empty);
    let minter = Minter {
        province_id: &data.province_id,
    };
    let mut state = OwState::default();

    // ── Ambtsgebied ──
    match &data.publication_data.area_of_jurisdiction {
        Some(aoj) => {
            let source_uuid = aoj.uuid.to_string();
            let prev = previous.ambtsgebieden.iter().find(|a| a.source_uuid == source_uuid);
            let (identification, object_status) = minter.resolve(
                "ambtsgebied",
                prev,
                |a| a.identification.as_str(),
                |a| {
                    a.administrative_borders_id == aoj.administrative_borders_id
                        && a.domain == aoj.administrative_borders_domain
                        && a.valid_on == aoj.administrative_borders_date
                        && a.title == aoj.title
                },
            );
            state.ambtsgebieden.push(OwAmbtsgebied {
                identification,
                object_status,
                procedure_status: None,
                source_uuid,
                administrative_borders_id: aoj.administrative_borders_id.clone(),
                domain: aoj.administrative_borders_domain.clone(),
                valid_on: aoj.administrative_borders_date.clone(),
                title: aoj.title.clone(),
            });
        }
        None => {
            state.ambtsgebieden = unchanged(&previous.ambtsgebieden, |a| {
                a.object_status = OwObjectStatus::Unchanged
            });
        }
    }

    // ── Regelingsgebied ──
    for ambtsgebied in &state.ambtsgebieden {
        let locatie_ref = LocationRef::Ambtsgebied {
            reference: ambtsgebied.identification.clone(),
        };
        let prev = previous
            .regelingsgebieden
            .iter()
            .find(|r| r.source_uuid == ambtsgebied.source_uuid);
        let (identification, object_status) = minter.resolve(
            "regelingsgebied",
            prev,
            |r| r.identification.as_str(),
            |r| r.locatie_ref == locatie_ref,
        );
        state.regelingsgebieden.push(OwRegelingsgebied {
            identification,
            object_status,
            procedure_status: None,
            source_uuid: ambtsgebied.source_uuid.clone(),
            locatie_ref,
        });
    }

    // ── Gebieden and gebiedengroepen ──
    for werkingsgebied in &data.publication_data.werkingsgebieden {
        let mut gebieden_refs = Vec::new();
        for (index, location) in werkingsgebied.locations.iter().enumerate() {
            let source_code = format!("{}-{index}", werkingsgebied.code);
            let prev = previous.gebieden.iter().find(|g| g.source_code == source_code);
            let (identification, object_status) = minter.resolve(
                "gebied",
                prev,
                |g| g.identification.as_str(),
                |g| !werkingsgebied.new && g.title == location.title && g.geometry_ref == location.uuid,
            );
            gebieden_refs.push(LocationRef::Gebied {
                target_code: source_code.clone(),
                reference: identification.clone(),
            });
            state.gebieden.push(OwGebied {
                identification,
                object_status,
                procedure_status: None,
                source_uuid: location.uuid.clone(),
                source_code,
                title: location.title.clone(),
                geometry_ref: location.uuid.clone(),
            });
        }

        let prev = previous
            .gebiedengroepen
            .iter()
            .find(|g| g.source_code == werkingsgebied.code);
        let (identification, object_status) = minter.resolve(
            "gebiedengroep",
            prev,
            |g| g.identification.as_str(),
            |g| g.title == werkingsgebied.title && g.gebieden_refs == gebieden_refs,
        );
        state.gebiedengroepen.push(OwGebiedengroep {
            identification,
            object_status,
            procedure_status: None,
            source_uuid: werkingsgebied.uuid.clone(),
            source_code: werkingsgebied.code.clone(),
            title: werkingsgebied.title.clone(),
            gebieden_refs,
        });
    }

    // ── Divisieteksten and tekstdelen ──
    for object in used_objects(data) {
        let Some(wid) = wid_map.get(&object.code) else {
            continue;
        };
        let location_refs = werkingsgebied_refs(object.werkingsgebied_code.as_deref(), &state);
        if location_refs.is_empty() {
            continue;
        }

        let prev = previous.divisieteksten.iter().find(|d| &d.wid == wid);
        let (divisie_id, object_status) = minter.resolve(
            "divisietekst",
            prev,
            |d| d.identification.as_str(),
            |d| d.source_code == object.code,
        );
        state.divisieteksten.push(OwDivisietekst {
            identification: divisie_id.clone(),
            object_status,
            procedure_status: None,
            source_uuid: object.uuid.to_string(),
            source_code: object.code.clone(),
            wid: wid.clone(),
        });

        let text_ref = WidRef::Divisietekst {
            target_wid: wid.clone(),
            reference: divisie_id,
        };
        let prev = previous.tekstdelen.iter().find(|t| t.source_code == object.code);
        let (identification, object_status) = minter.resolve(
            "tekstdeel",
            prev,
            |t| t.identification.as_str(),
            |t| t.text_ref == text_ref && t.location_refs == location_refs,
        );
        state.tekstdelen.push(OwTekstdeel {
            identification,
            object_status,
            procedure_status: None,
            source_uuid: object.uuid.to_string(),
            source_code: object.code.clone(),
            idealization: INDICATIVE_IDEALIZATION.to_string(),
            text_ref,
            location_refs,
        });
    }

    let terminated = terminated(previous, &state);
    OwDelta { state, terminated }
}

fn unchanged<T: Clone>(objects: &[T], mark: impl Fn(&mut T)) -> Vec<T> {
    objects
        .iter()
        .cloned()
        .map(|mut o| {
            mark(&mut o);
            o
        })
        .collect()
}

fn werkingsgebied_refs(werkingsgebied_code: Option<&str>, state: &OwState) -> Vec<LocationRef> {
    let Some(code) = werkingsgebied_code else {
        return Vec::new();
    };
    state
        .gebiedengroepen
        .iter()
        .filter(|g| g.source_code == code)
        .map(|g| LocationRef::Gebiedengroep {
            target_code: g.source_code.clone(),
            reference: g.identification.clone(),
        })
        .collect()
}

fn identifications(state: &OwState) -> BTreeSet<&str> {
    state
        .ambtsgebieden
        .iter()
        .map(|o| o.identification.as_str())
        .chain(state.regelingsgebieden.iter().map(|o| o.identification.as_str()))
        .chain(state.gebieden.iter().map(|o| o.identification.as_str()))
        .chain(state.gebiedengroepen.iter().map(|o| o.identification.as_str()))
        .chain(state.gebiedsaanwijzingen.iter().map(|o| o.identification.as_str()))
        .chain(state.divisies.iter().map(|o| o.identification.as_str()))
        .chain(state.divisieteksten.iter().map(|o| o.identification.as_str()))
        .chain(state.tekstdelen.iter().map(|o| o.identification.as_str()))
        .collect()
}

fn terminated(previous: &OwState, current: &OwState) -> Vec<String> {
    let current = identifications(current);
    identifications(previous)
        .into_iter()
        .filter(|id| !current.contains(id))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{AreaOfJurisdiction, InputLocation, InputWerkingsgebied};
    use crate::test_support::{act_input, frbr, publication_object};

    fn werkingsgebied(code: &str, new: bool) -> InputWerkingsgebied {
        InputWerkingsgebied {
            uuid: format!("{code}-uuid"),
            identifier: "id".into(),
            hash: "h".into(),
            object_id: 3,
            code: code.into(),
            new,
            frbr: frbr("2_1-1-3", 1),
            title: "Bodem".into(),
            owner_act: "/akn/nl/act/pv28/2024/2_1".into(),
            locations: vec![InputLocation {
                uuid: format!("{code}-uuid"),
                identifier: "loc".into(),
                gml_id: "gml".into(),
                group_id: "group".into(),
                title: "Bodem".into(),
                gml: "<gml/>".into(),
            }],
        }
    }

    fn input() -> (ActInputData, BTreeMap<String, String>) {
        let mut data = act_input();
        let mut object = publication_object("beleidskeuze-1", 1);
        object.werkingsgebied_code = Some("werkingsgebied-3".into());
        data.publication_data.used_object_codes = ["beleidskeuze-1".to_string()].into();
        data.publication_data.objects = vec![object, publication_object("beleidskeuze-2", 2)];
        data.publication_data.used_object_codes.insert("beleidskeuze-2".into());
        data.publication_data.werkingsgebieden = vec![werkingsgebied("werkingsgebied-3", true)];
        data.publication_data.area_of_jurisdiction = Some(AreaOfJurisdiction {
            uuid: Uuid::new_v4(),
            title: "Provincie".into(),
            administrative_borders_id: "PV28".into(),
            administrative_borders_domain: "NL.BI.BestuurlijkGebied".into(),
            administrative_borders_date: "2023-01-01".into(),
        });
        let wid_map = [
            ("beleidskeuze-1".to_string(), "w1".to_string()),
            ("beleidskeuze-2".to_string(), "w2".to_string()),
        ]
        .into();
        (data, wid_map)
    }

    #[test]
    fn first_delivery_is_all_new() {
        let (data, wid_map) = input();
        let delta = build_ow_delta(&data, &wid_map);
        let s = &delta.state;
        assert_eq!(s.ambtsgebieden.len(), 1);
        assert_eq!(s.regelingsgebieden.len(), 1);
        assert_eq!(s.gebieden.len(), 1);
        assert_eq!(s.gebiedengroepen.len(), 1);
        // Only the object with a werkingsgebied gets a tekstdeel.
        assert_eq!(s.divisieteksten.len(), 1);
        assert_eq!(s.tekstdelen.len(), 1);
        assert_eq!(delta.changed_count(), 6);
        assert!(delta.terminated.is_empty());

        assert_eq!(s.gebieden[0].source_code, "werkingsgebied-3-0");
        assert!(s.ambtsgebieden[0].identification.starts_with("nl.imow-pv28.ambtsgebied."));
        assert_eq!(
            s.tekstdelen[0].location_refs,
            vec![LocationRef::Gebiedengroep {
                target_code: "werkingsgebied-3".into(),
                reference: s.gebiedengroepen[0].identification.clone(),
            }]
        );
    }

    #[test]
    fn unchanged_input_keeps_identifications() {
        let (mut data, wid_map) = input();
        let first = build_ow_delta(&data, &wid_map);

        data.ow_state = Some(first.state.clone());
        data.publication_data.werkingsgebieden = vec![werkingsgebied("werkingsgebied-3", false)];
        let second = build_ow_delta(&data, &wid_map);

        assert!(!second.has_changes());
        assert_eq!(
            identifications(&first.state),
            identifications(&second.state)
        );
    }

    #[test]
    fn changed_werkingsgebied_marks_gebied_changed() {
        let (mut data, wid_map) = input();
        let first = build_ow_delta(&data, &wid_map);

        data.ow_state = Some(first.state.clone());
        let second = build_ow_delta(&data, &wid_map);
        assert_eq!(second.state.gebieden[0].object_status, OwObjectStatus::Changed);
        assert_eq!(
            second.state.gebieden[0].identification,
            first.state.gebieden[0].identification
        );
        assert_eq!(second.state.gebiedengroepen[0].object_status, OwObjectStatus::Unchanged);
    }

    #[test]
    fn dropped_werkingsgebied_is_terminated() {
        let (mut data, wid_map) = input();
        let first = build_ow_delta(&data, &wid_map);

        data.ow_state = Some(first.state.clone());
        data.publication_data.werkingsgebieden.clear();
        let second = build_ow_delta(&data, &wid_map);

        // gebied, gebiedengroep, divisietekst and tekstdeel.
        assert_eq!(second.terminated.len(), 4);
        assert!(second.state.tekstdelen.is_empty());
        assert_eq!(second.state.ambtsgebieden[0].object_status, OwObjectStatus::Unchanged);
    }
}
