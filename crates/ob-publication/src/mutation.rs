//! # Act Mutation
//!
//! Reconciles freshly minted package input with the act already active in
//! the environment. Werkingsgebieden and documents whose content did not
//! change are republished under their previous identity; changed ones keep
//! their work and move to the next expression.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::error::PublicationError;
use crate::input::{ActInputData, ActMutation, InputDocument, InputWerkingsgebied, RemovedWerkingsgebied};
use crate::providers::AssetProvider;
use crate::state::v5::{ActiveAct, Werkingsgebied};
use ob_core::ActFrbr;

pub struct PatchActMutation<'a> {
    asset_provider: &'a dyn AssetProvider,
    active_act: &'a ActiveAct,
}

impl<'a> PatchActMutation<'a> {
    pub fn new(asset_provider: &'a dyn AssetProvider, active_act: &'a ActiveAct) -> Self {
        Self {
            asset_provider,
            active_act,
        }
    }

    pub fn patch(&self, mut data: ActInputData) -> Result<ActInputData, PublicationError> {
        for werkingsgebied in &mut data.publication_data.werkingsgebieden {
            self.patch_werkingsgebied(werkingsgebied)?;
        }
        for document in &mut data.publication_data.documents {
            self.patch_document(document);
        }
        self.patch_assets(&mut data)?;
        data.act_mutation = Some(self.act_mutation(&data));
        data.ow_state = Some(self.active_act.ow_state.clone());
        Ok(data)
    }

    fn patch_werkingsgebied(&self, input: &mut InputWerkingsgebied) -> Result<(), PublicationError> {
        let Some(existing) = self.active_act.werkingsgebieden.get(&input.object_id) else {
            return Ok(());
        };

        input.owner_act = existing.owner_act.clone();

        if is_same_werkingsgebied(existing, input) {
            // Only werkingsgebieden that are their own single location exist.
            let [location] = existing.locations.as_slice() else {
                return Err(PublicationError::MergingLocations);
            };
            let Some(target) = input.locations.first_mut() else {
                return Err(PublicationError::MergingLocations);
            };

            input.new = false;
            input.uuid = existing.uuid.clone();
            input.identifier = existing.identifier.clone();
            target.uuid = location.uuid.clone();
            target.identifier = location.identifier.clone();
            target.gml_id = location.gml_id.clone();
            target.group_id = location.group_id.clone();
            input.frbr = ob_core::Frbr {
                work_country: input.frbr.work_country.clone(),
                ..existing.frbr.clone()
            };
        } else {
            input.new = true;
            input.frbr.work_province_id = existing.frbr.work_province_id.clone();
            input.frbr.work_date = existing.frbr.work_date.clone();
            input.frbr.work_other = existing.frbr.work_other.clone();
            input.frbr.expression_version = existing.frbr.expression_version + 1;
        }
        Ok(())
    }

    fn patch_document(&self, input: &mut InputDocument) {
        let Some(existing) = self.active_act.documents.get(&input.object_id) else {
            return;
        };

        input.owner_act = existing.owner_act.clone();

        if input.hash == existing.hash {
            input.new = false;
            input.uuid = existing.uuid.clone();
            input.frbr = ob_core::Frbr {
                work_country: input.frbr.work_country.clone(),
                ..existing.frbr.clone()
            };
        } else {
            input.new = true;
            input.frbr.work_province_id = existing.frbr.work_province_id.clone();
            input.frbr.work_date = existing.frbr.work_date.clone();
            input.frbr.work_other = existing.frbr.work_other.clone();
            input.frbr.expression_version = existing.frbr.expression_version + 1;
        }
    }

    /// Assets stay available to the consolidated act even when the new
    /// objects no longer embed them.
    fn patch_assets(&self, data: &mut ActInputData) -> Result<(), PublicationError> {
        let fetched: BTreeSet<&str> = data
            .publication_data
            .assets
            .iter()
            .map(|a| a.uuid.as_str())
            .collect();

        let missing = self
            .active_act
            .assets
            .values()
            .filter(|a| !fetched.contains(a.uuid.as_str()))
            .map(|a| Uuid::parse_str(&a.uuid).map_err(|_| PublicationError::MissingAsset(a.uuid.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        if missing.is_empty() {
            return Ok(());
        }

        let additional = self.asset_provider.get_assets_by_uuids(&missing)?;
        if let Some(unresolved) = missing
            .iter()
            .find(|uuid| !additional.iter().any(|a| a.uuid == uuid.to_string()))
        {
            return Err(PublicationError::MissingAsset(unresolved.to_string()));
        }
        data.publication_data.assets.extend(additional);
        Ok(())
    }

    fn act_mutation(&self, data: &ActInputData) -> ActMutation {
        let used: BTreeSet<i64> = data
            .publication_data
            .werkingsgebieden
            .iter()
            .map(|w| w.object_id)
            .collect();

        let removed_werkingsgebieden = self
            .active_act
            .werkingsgebieden
            .values()
            .filter(|w| !used.contains(&w.object_id))
            .map(|w| RemovedWerkingsgebied {
                uuid: w.uuid.clone(),
                code: format!("werkingsgebied-{}", w.object_id),
                object_id: w.object_id,
                owner_act: w.owner_act.clone(),
                title: w.title.clone(),
                frbr: w.frbr.clone(),
            })
            .collect();

        ActMutation {
            consolidated_act_frbr: ActFrbr {
                act_id: 0,
                frbr: self.active_act.act_frbr.clone(),
            },
            consolidated_act_text: self.active_act.act_text.clone(),
            known_wid_map: self.active_act.wid_data.known_wid_map.clone(),
            known_wids: self.active_act.wid_data.known_wids.clone(),
            removed_werkingsgebieden,
        }
    }
}

fn is_same_werkingsgebied(existing: &Werkingsgebied, input: &InputWerkingsgebied) -> bool {
    existing.is_still_valid()
        && existing.locations.len() == input.locations.len()
        && existing.hash == input.hash
}
