//! # Environment State Models
//!
//! One module per stored schema version. Older versions are kept so a
//! stored document can be deserialised exactly as it was written and then
//! walked up the upgrade chain.
//!
//! | version | change |
//! |---|---|
//! | 1 | initial |
//! | 2 | werkingsgebied title/hash, typed OW objects, publication version uuid |
//! | 3 | assets and documents |
//! | 4 | werkingsgebied locations |
//! | 5 | typed OW state |

pub mod common;
pub mod ow;
pub mod v1;
pub mod v2;
pub mod v3;
pub mod v4;
pub mod v5;

pub use common::{act_key, ActiveAnnouncement, Asset, Document, Location, StoredState, WidData};
pub use v5::StateV5;

use crate::error::PublicationError;

pub const CURRENT_SCHEMA_VERSION: u32 = v5::SCHEMA_VERSION;

/// The state model patchers and builders work with.
pub type ActiveState = StateV5;

/// A deserialised state of any known schema version.
#[derive(Debug, Clone, PartialEq)]
pub enum StateAny {
    V1(v1::StateV1),
    V2(v2::StateV2),
    V3(v3::StateV3),
    V4(v4::StateV4),
    V5(v5::StateV5),
}

impl StateAny {
    pub fn schema_version(&self) -> u32 {
        match self {
            Self::V1(_) => v1::SCHEMA_VERSION,
            Self::V2(_) => v2::SCHEMA_VERSION,
            Self::V3(_) => v3::SCHEMA_VERSION,
            Self::V4(_) => v4::SCHEMA_VERSION,
            Self::V5(_) => v5::SCHEMA_VERSION,
        }
    }

    pub fn to_stored(&self) -> Result<StoredState, PublicationError> {
        let data = match self {
            Self::V1(s) => serde_json::to_value(s)?,
            Self::V2(s) => serde_json::to_value(s)?,
            Self::V3(s) => serde_json::to_value(s)?,
            Self::V4(s) => serde_json::to_value(s)?,
            Self::V5(s) => serde_json::to_value(s)?,
        };
        Ok(StoredState {
            schema_version: self.schema_version(),
            data,
        })
    }
}

impl StateV5 {
    pub fn to_stored(&self) -> Result<StoredState, PublicationError> {
        Ok(StoredState {
            schema_version: v5::SCHEMA_VERSION,
            data: serde_json::to_value(self)?,
        })
    }
}
