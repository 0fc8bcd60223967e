//! # State Upgraders
//!
//! Each upgrader lifts a state exactly one schema version. The loader
//! chains them until the current version is reached, so a stored state is
//! never rewritten in place: the upgraded model only lives in memory until
//! a new state is created from it.
//!
//! | upgrader | from | to | needs |
//! |---|---|---|---|
//! | [`StateV2Upgrader`] | 1 | 2 | publication data repository |
//! | [`StateV3Upgrader`] | 2 | 3 | act text |
//! | [`StateV4Upgrader`] | 3 | 4 | |
//! | [`StateV5Upgrader`] | 4 | 5 | |

use ob_core::EnvironmentId;

use crate::error::PublicationError;
use crate::state::StateAny;

pub mod v2;
pub mod v3;
pub mod v4;
pub mod v5;

pub use v2::{LegacyPublicationData, PublicationDataRepository, SourceWerkingsgebied, StateV2Upgrader};
pub use v3::StateV3Upgrader;
pub use v4::StateV4Upgrader;
pub use v5::StateV5Upgrader;

pub trait StateUpgrader: Send + Sync {
    fn input_schema_version(&self) -> u32;

    fn output_schema_version(&self) -> u32 {
        self.input_schema_version() + 1
    }

    /// Lift `state` one version. A state of any other version than
    /// [`input_schema_version`](Self::input_schema_version) is rejected with
    /// [`PublicationError::UnexpectedState`].
    fn upgrade(
        &self,
        environment: EnvironmentId,
        state: StateAny,
    ) -> Result<StateAny, PublicationError>;
}
