//! # ob-publication: Environment State and Package Preparation
//!
//! Everything between "a publication version is ready" and "LVBB has an
//! archive": the versioned environment state, the chain that upgrades old
//! snapshots, the reconciliation of new input against the active act, and
//! the builders that produce the package and the next state.
//!
//! ## Module Map
//!
//! | module | role |
//! |---|---|
//! | `state` | stored state models v1..v5 and the OW state |
//! | `actions` | the actions a v5 state applies to itself |
//! | `upgrade` | one upgrader per schema step |
//! | `factory` | schema version to upgrader registry |
//! | `loader` | walks a stored state up to the current version |
//! | `providers` | FRBR minting, werkingsgebieden, documents, assets |
//! | `mutation` | patches input against the active act |
//! | `validation` | rules run before a package is built |
//! | `act_text` | renders the act text and pins wIds |
//! | `ow_builder` | OW objects and the delta against the last delivery |
//! | `patcher` | applies a package to a copy of the source state |
//! | `builder` | act and announcement package builders |
//! | `report` | LVBB report parsing |
//!
//! ## Crate Policy
//!
//! - No storage access. Repositories and asset lookups are traits the
//!   caller implements.
//! - A source state is never mutated; patchers return a new state.

pub mod act_text;
pub mod actions;
pub mod asset_parser;
pub mod builder;
pub mod error;
pub mod factory;
pub mod input;
pub mod loader;
pub mod mutation;
pub mod ow_builder;
pub mod patcher;
pub mod providers;
pub mod report;
pub mod state;
pub mod upgrade;
pub mod validation;

#[cfg(test)]
mod test_support;

// ─── State re-exports ───────────────────────────────────────────────

pub use state::{ActiveState, StateAny, StateV5, StoredState, CURRENT_SCHEMA_VERSION};

// ─── Upgrade chain re-exports ───────────────────────────────────────

pub use factory::StateVersionFactory;
pub use loader::{EnvironmentStateRepository, StateLoader};
pub use upgrade::StateUpgrader;

// ─── Package re-exports ─────────────────────────────────────────────

pub use builder::{ActPackageBuilder, AnnouncementPackageBuilder, PackageZip};
pub use error::PublicationError;
pub use input::{ActInputData, AnnouncementInputData, PublicationData, PublicationObject};
pub use providers::AssetProvider;
pub use report::parse_report;
pub use validation::{ValidatePublicationService, ValidationError};
