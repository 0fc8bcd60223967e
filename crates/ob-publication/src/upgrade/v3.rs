//! Version 2 → 3: assets are recovered from the `Illustratie` elements of
//! the act text. Documents did not exist before version 3.

use std::collections::BTreeMap;

use ob_core::EnvironmentId;

use super::StateUpgrader;
use crate::asset_parser::asset_uuids;
use crate::error::PublicationError;
use crate::state::{v2, v3, Asset, StateAny};

pub struct StateV3Upgrader;

impl StateUpgrader for StateV3Upgrader {
    fn input_schema_version(&self) -> u32 {
        v2::SCHEMA_VERSION
    }

    fn upgrade(
        &self,
        _environment: EnvironmentId,
        state: StateAny,
    ) -> Result<StateAny, PublicationError> {
        let StateAny::V2(old) = state else {
            return Err(PublicationError::UnexpectedState);
        };

        let acts = old
            .acts
            .into_iter()
            .map(|(key, act)| Ok((key, upgrade_act(act)?)))
            .collect::<Result<BTreeMap<_, _>, PublicationError>>()?;

        Ok(StateAny::V3(v3::StateV3 {
            purposes: old.purposes,
            acts,
            announcements: old.announcements,
        }))
    }
}

fn upgrade_act(act: v2::ActiveAct) -> Result<v3::ActiveAct, PublicationError> {
    let assets = asset_uuids(&act.act_text)?
        .into_iter()
        .map(|uuid| (uuid.clone(), Asset { uuid }))
        .collect();

    Ok(v3::ActiveAct {
        act_frbr: act.act_frbr,
        bill_frbr: act.bill_frbr,
        consolidation_purpose: act.consolidation_purpose,
        document_type: act.document_type,
        procedure_type: act.procedure_type,
        werkingsgebieden: act.werkingsgebieden,
        documents: BTreeMap::new(),
        assets,
        wid_data: act.wid_data,
        ow_data: act.ow_data,
        act_text: act.act_text,
        publication_version_uuid: act.publication_version_uuid,
    })
}
