//! Version 3 → 4: werkingsgebieden get explicit locations.
//!
//! Older werkingsgebieden were their own single location, with ids derived
//! from the werkingsgebied uuid. That shape is reproduced here so existing
//! GIO deliveries keep matching:
//!
//! ```text
//! Identifier  lo-{act_id}-{uuid}
//! Gml_ID      gml-lo-{act_id}-{uuid}
//! Group_ID    groep-lo-{act_id}-{uuid}
//! ```

use std::collections::BTreeMap;

use ob_core::EnvironmentId;

use super::StateUpgrader;
use crate::error::PublicationError;
use crate::state::{v3, v4, Location, StateAny};

pub struct StateV4Upgrader;

impl StateUpgrader for StateV4Upgrader {
    fn input_schema_version(&self) -> u32 {
        v3::SCHEMA_VERSION
    }

    fn upgrade(
        &self,
        _environment: EnvironmentId,
        state: StateAny,
    ) -> Result<StateAny, PublicationError> {
        let StateAny::V3(old) = state else {
            return Err(PublicationError::UnexpectedState);
        };

        let acts = old
            .acts
            .into_iter()
            .map(|(key, act)| (key, upgrade_act(act)))
            .collect();

        Ok(StateAny::V4(v4::StateV4 {
            purposes: old.purposes,
            acts,
            announcements: old.announcements,
        }))
    }
}

fn upgrade_act(act: v3::ActiveAct) -> v4::ActiveAct {
    let werkingsgebieden: BTreeMap<i64, v4::Werkingsgebied> = act
        .werkingsgebieden
        .into_iter()
        .map(|(object_id, w)| (object_id, upgrade_werkingsgebied(w)))
        .collect();

    v4::ActiveAct {
        act_frbr: act.act_frbr,
        bill_frbr: act.bill_frbr,
        consolidation_purpose: act.consolidation_purpose,
        document_type: act.document_type,
        procedure_type: act.procedure_type,
        werkingsgebieden,
        documents: act.documents,
        assets: act.assets,
        wid_data: act.wid_data,
        ow_data: act.ow_data,
        act_text: act.act_text,
        publication_version_uuid: act.publication_version_uuid,
    }
}

fn upgrade_werkingsgebied(w: v3::Werkingsgebied) -> v4::Werkingsgebied {
    let act_id = w.frbr.work_other.split('-').next().unwrap_or_default();
    let base_id = format!("lo-{act_id}-{}", w.uuid);
    let location = Location {
        uuid: w.uuid.clone(),
        identifier: base_id.clone(),
        gml_id: format!("gml-{base_id}"),
        group_id: format!("groep-{base_id}"),
        title: w.title.clone(),
    };

    v4::Werkingsgebied {
        uuid: w.uuid,
        identifier: w.identifier,
        hash: w.hash,
        object_id: w.object_id,
        title: w.title,
        owner_act: w.owner_act,
        frbr: w.frbr,
        locations: vec![location],
    }
}
