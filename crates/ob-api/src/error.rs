//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from ob-state and ob-publication to HTTP status codes.
//! Publication workflows answer with a few non-standard codes:
//!
//! | Status | Meaning |
//! |--------|---------|
//! | 441 | publication input failed validation (`details` lists the errors) |
//! | 444 | a dry-run validation found rule violations (`details` lists them) |
//! | 450 | abort not confirmed |
//! | 451 | abort of a non-publication package |
//! | 452 | abort outside the window or not the latest package in the chain |
//! | 406 | abort of a package whose report is not valid |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use ob_core::CoreError;
use ob_publication::PublicationError;
use ob_state::{AbortError, EnvironmentError, ModuleError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for publication input errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body parsed but violates a business rule (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed, or an upload is unusable (400).
    #[error("{0}")]
    BadRequest(String),

    /// Conflict with current resource state: locks, disabled package types,
    /// illegal lifecycle transitions (409).
    #[error("{0}")]
    Conflict(String),

    /// The data a package is built from is not publishable (441).
    #[error("{message}")]
    PublicationInput {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Dry-run validation found rule violations (444).
    #[error("{message}")]
    PublicationRules {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Abort refused by the abort guard (450, 451, 452, 406 or 500).
    #[error("{0}")]
    Abort(AbortError),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::PublicationInput { .. } => (custom_status(441), "PUBLICATION_INPUT_ERROR"),
            Self::PublicationRules { .. } => (custom_status(444), "PUBLICATION_RULES_FAILED"),
            Self::Abort(e) => (custom_status(e.status_code()), "ABORT_REFUSED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

fn custom_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match self {
            Self::PublicationInput { details, .. } | Self::PublicationRules { details, .. } => {
                details
            }
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Module transitions that do not fit the current lifecycle state conflict.
impl From<ModuleError> for AppError {
    fn from(err: ModuleError) -> Self {
        match &err {
            ModuleError::UnknownStatus(_) | ModuleError::InternalStatus(_) => {
                Self::Validation(err.to_string())
            }
            _ => Self::Conflict(err.to_string()),
        }
    }
}

impl From<EnvironmentError> for AppError {
    fn from(err: EnvironmentError) -> Self {
        match err {
            EnvironmentError::Locked => Self::Conflict("This environment is locked".to_string()),
            EnvironmentError::Inactive => {
                Self::Conflict("This environment is not active".to_string())
            }
            other => Self::Conflict(other.to_string()),
        }
    }
}

/// Malformed codes, dates and enum values supplied by the client.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Serialization(e) => Self::Internal(e.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<AbortError> for AppError {
    fn from(err: AbortError) -> Self {
        Self::Abort(err)
    }
}

impl From<PublicationError> for AppError {
    fn from(err: PublicationError) -> Self {
        match err {
            PublicationError::Validation(errors) => Self::PublicationInput {
                message: "Error(s) found while validating publication".to_string(),
                details: serde_json::to_value(&errors).ok(),
            },
            PublicationError::MissingArea(_)
            | PublicationError::MissingFile(_)
            | PublicationError::MissingAsset(_)
            | PublicationError::DuplicateDocumentFilenames
            | PublicationError::MissingActText => Self::PublicationInput {
                message: err.to_string(),
                details: None,
            },
            PublicationError::NoSourceState => Self::Conflict(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
