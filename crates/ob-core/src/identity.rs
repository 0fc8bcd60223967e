//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers that flow between modules,
//! publication environments, environment states and act packages. You
//! cannot pass a `StateId` where an `EnvironmentId` is expected.
//!
//! `ObjectCode` is the durable identity of a policy object. Codes are
//! globally unique and never change once allocated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier for a module (a draft change set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub Uuid);

/// Unique identifier for a publication environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentId(pub Uuid);

/// Unique identifier for a consolidated environment state snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId(pub Uuid);

/// Unique identifier for a generated act or announcement package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId(pub Uuid);

macro_rules! uuid_identity {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_identity!(ModuleId, "module");
uuid_identity!(EnvironmentId, "environment");
uuid_identity!(StateId, "state");
uuid_identity!(PackageId, "package");

/// Durable code of a policy object: `"{object_type}-{object_id}"`.
///
/// The object type is lowercase ASCII with optional underscores; the object
/// id is a positive integer allocated per object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectCode {
    object_type: String,
    object_id: i64,
}

impl ObjectCode {
    /// Build a code from its parts.
    pub fn new(object_type: impl Into<String>, object_id: i64) -> Result<Self, CoreError> {
        let object_type = object_type.into();
        validate_object_type(&object_type, &format!("{object_type}-{object_id}"))?;
        if object_id < 1 {
            return Err(CoreError::InvalidCode {
                code: format!("{object_type}-{object_id}"),
                reason: "object id must be positive".to_string(),
            });
        }
        Ok(Self {
            object_type,
            object_id,
        })
    }

    /// Parse a code such as `"beleidskeuze-12"`.
    pub fn parse(code: &str) -> Result<Self, CoreError> {
        let (object_type, id) = code.rsplit_once('-').ok_or_else(|| CoreError::InvalidCode {
            code: code.to_string(),
            reason: "missing object id".to_string(),
        })?;
        let object_id: i64 = id.parse().map_err(|_| CoreError::InvalidCode {
            code: code.to_string(),
            reason: format!("object id '{id}' is not an integer"),
        })?;
        Self::new(object_type, object_id)
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn object_id(&self) -> i64 {
        self.object_id
    }
}

fn validate_object_type(object_type: &str, code: &str) -> Result<(), CoreError> {
    let valid = !object_type.is_empty()
        && object_type
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidCode {
            code: code.to_string(),
            reason: "object type must be lowercase ascii".to_string(),
        })
    }
}

impl std::fmt::Display for ObjectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.object_type, self.object_id)
    }
}

impl TryFrom<String> for ObjectCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectCode> for String {
    fn from(value: ObjectCode) -> Self {
        value.to_string()
    }
}
