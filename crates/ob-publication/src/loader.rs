//! # State Loader
//!
//! Turns a stored state of any known schema version into the current
//! model by walking the upgrade chain one version at a time.

use ob_core::{EnvironmentId, StateId};
use ob_state::Environment;

use crate::error::PublicationError;
use crate::factory::StateVersionFactory;
use crate::state::{StateAny, StateV5, StoredState, CURRENT_SCHEMA_VERSION};

/// Read access to persisted environment states.
pub trait EnvironmentStateRepository {
    fn get_state(&self, id: StateId) -> Option<StoredState>;
}

pub struct StateLoader {
    factory: StateVersionFactory,
}

impl StateLoader {
    pub fn new(factory: StateVersionFactory) -> Self {
        Self { factory }
    }

    pub fn load(
        &self,
        environment: EnvironmentId,
        stored: &StoredState,
    ) -> Result<StateV5, PublicationError> {
        let mut state = self
            .factory
            .get_state_model(stored.schema_version, stored.data.clone())?;

        while state.schema_version() < CURRENT_SCHEMA_VERSION {
            let from = state.schema_version();
            let upgrader = self
                .factory
                .upgrader_for(from)
                .ok_or(PublicationError::MissingUpgrader(from))?;

            tracing::info!(
                %environment,
                from,
                to = upgrader.output_schema_version(),
                "upgrading environment state"
            );
            state = upgrader.upgrade(environment, state)?;

            if state.schema_version() != from + 1 {
                return Err(PublicationError::UnexpectedState);
            }
        }

        match state {
            StateAny::V5(state) => Ok(state),
            other => Err(PublicationError::UnknownSchemaVersion(other.schema_version())),
        }
    }

    /// The active state of `environment`, upgraded to the current schema.
    ///
    /// Returns `None` when the environment has no active state yet.
    pub fn load_environment_state(
        &self,
        repository: &dyn EnvironmentStateRepository,
        environment: &Environment,
    ) -> Result<Option<StateV5>, PublicationError> {
        let Some(state_id) = environment.active_state else {
            return Ok(None);
        };
        let stored = repository
            .get_state(state_id)
            .ok_or(PublicationError::NoSourceState)?;
        self.load(environment.id, &stored).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::state::v4;
    use crate::upgrade::StateUpgrader;

    struct MemoryRepository(HashMap<StateId, StoredState>);

    impl EnvironmentStateRepository for MemoryRepository {
        fn get_state(&self, id: StateId) -> Option<StoredState> {
            self.0.get(&id).cloned()
        }
    }

    fn loader() -> StateLoader {
        StateLoader::new(StateVersionFactory::offline())
    }

    fn stored(schema_version: u32) -> StoredState {
        StoredState {
            schema_version,
            data: json!({"Purposes": {}, "Acts": {}, "Announcements": {}}),
        }
    }

    #[test]
    fn current_version_loads_as_is() {
        let state = loader().load(EnvironmentId::new(), &stored(5)).unwrap();
        assert_eq!(state, StateV5::default());
    }

    #[test]
    fn older_versions_walk_the_chain() {
        for version in 2..=4 {
            let state = loader().load(EnvironmentId::new(), &stored(version)).unwrap();
            assert!(state.acts.is_empty());
        }
    }

    #[test]
    fn v1_needs_publication_data() {
        assert!(matches!(
            loader().load(EnvironmentId::new(), &stored(1)),
            Err(PublicationError::MissingUpgrader(1))
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        assert!(matches!(
            loader().load(EnvironmentId::new(), &stored(9)),
            Err(PublicationError::UnknownSchemaVersion(9))
        ));
    }

    struct SkippingUpgrader;

    impl StateUpgrader for SkippingUpgrader {
        fn input_schema_version(&self) -> u32 {
            3
        }

        fn upgrade(
            &self,
            _environment: EnvironmentId,
            _state: StateAny,
        ) -> Result<StateAny, PublicationError> {
            Ok(StateAny::V5(StateV5::default()))
        }
    }

    #[test]
    fn skipped_version_is_rejected() {
        let mut factory = StateVersionFactory::offline();
        factory.register(std::sync::Arc::new(SkippingUpgrader));
        let result = StateLoader::new(factory).load(EnvironmentId::new(), &stored(3));
        assert!(matches!(result, Err(PublicationError::UnexpectedState)));
    }

    struct RepeatingUpgrader;

    impl StateUpgrader for RepeatingUpgrader {
        fn input_schema_version(&self) -> u32 {
            4
        }

        fn upgrade(
            &self,
            _environment: EnvironmentId,
            state: StateAny,
        ) -> Result<StateAny, PublicationError> {
            Ok(state)
        }
    }

    #[test]
    fn repeated_version_is_rejected() {
        let mut factory = StateVersionFactory::offline();
        factory.register(std::sync::Arc::new(RepeatingUpgrader));
        let result = StateLoader::new(factory).load(
            EnvironmentId::new(),
            &StateAny::V4(v4::StateV4::default()).to_stored().unwrap(),
        );
        assert!(matches!(result, Err(PublicationError::UnexpectedState)));
    }

    #[test]
    fn environment_without_active_state_loads_nothing() {
        let environment = Environment::new("Productie", "pv28", true);
        let repository = MemoryRepository(HashMap::new());
        assert!(loader()
            .load_environment_state(&repository, &environment)
            .unwrap()
            .is_none());
    }

    #[test]
    fn environment_state_is_read_through_repository() {
        let mut environment = Environment::new("Productie", "pv28", true);
        let state_id = StateId::new();
        environment.active_state = Some(state_id);
        let repository = MemoryRepository([(state_id, stored(4))].into());
        let state = loader()
            .load_environment_state(&repository, &environment)
            .unwrap();
        assert_eq!(state, Some(StateV5::default()));
    }
}
