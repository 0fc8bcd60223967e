//! Maps stored schema versions to state models and upgraders.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::PublicationError;
use crate::state::{v1, v2, v3, v4, v5, StateAny};
use crate::upgrade::{
    PublicationDataRepository, StateUpgrader, StateV2Upgrader, StateV3Upgrader, StateV4Upgrader,
    StateV5Upgrader,
};

pub struct StateVersionFactory {
    upgraders: BTreeMap<u32, Arc<dyn StateUpgrader>>,
}

impl StateVersionFactory {
    /// Factory with the full upgrade chain. The v1 → v2 upgrade reads the
    /// original publication data through `repository`.
    pub fn new(repository: Arc<dyn PublicationDataRepository>) -> Self {
        let mut factory = Self::offline();
        factory.register(Arc::new(StateV2Upgrader::new(repository)));
        factory
    }

    /// Factory without the v1 → v2 upgrade, for callers that have no
    /// access to publication data.
    pub fn offline() -> Self {
        let mut factory = Self {
            upgraders: BTreeMap::new(),
        };
        factory.register(Arc::new(StateV3Upgrader));
        factory.register(Arc::new(StateV4Upgrader));
        factory.register(Arc::new(StateV5Upgrader));
        factory
    }

    pub(crate) fn register(&mut self, upgrader: Arc<dyn StateUpgrader>) {
        self.upgraders
            .insert(upgrader.input_schema_version(), upgrader);
    }

    pub fn get_state_model(&self, version: u32, data: Value) -> Result<StateAny, PublicationError> {
        let state = match version {
            v1::SCHEMA_VERSION => StateAny::V1(serde_json::from_value(data)?),
            v2::SCHEMA_VERSION => StateAny::V2(serde_json::from_value(data)?),
            v3::SCHEMA_VERSION => StateAny::V3(serde_json::from_value(data)?),
            v4::SCHEMA_VERSION => StateAny::V4(serde_json::from_value(data)?),
            v5::SCHEMA_VERSION => StateAny::V5(serde_json::from_value(data)?),
            other => return Err(PublicationError::UnknownSchemaVersion(other)),
        };
        Ok(state)
    }

    /// Upgrader taking a state of `version` to `version + 1`.
    pub fn upgrader_for(&self, version: u32) -> Option<&dyn StateUpgrader> {
        self.upgraders.get(&version).map(|u| u.as_ref())
    }
}
