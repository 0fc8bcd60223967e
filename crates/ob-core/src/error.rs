//! # Error Types
//!
//! Errors raised while constructing or parsing core value types.

use thiserror::Error;

/// Top-level error type for `ob-core`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An object code did not have the `"{object_type}-{object_id}"` shape.
    #[error("invalid object code '{code}': {reason}")]
    InvalidCode {
        /// The rejected input.
        code: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A date string could not be parsed as `%Y-%m-%d`.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// An enum discriminator string was not recognised.
    #[error("unknown {kind} '{value}'")]
    UnknownVariant {
        /// The enum being parsed (e.g. "procedure type").
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_code_display() {
        let err = CoreError::InvalidCode {
            code: "beleidskeuze".to_string(),
            reason: "missing object id".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("beleidskeuze"));
        assert!(msg.contains("missing object id"));
    }

    #[test]
    fn unknown_variant_display() {
        let err = CoreError::UnknownVariant {
            kind: "procedure type",
            value: "sketch".to_string(),
        };
        assert_eq!(format!("{err}"), "unknown procedure type 'sketch'");
    }

    #[test]
    fn serialization_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CoreError = serde_err.into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
