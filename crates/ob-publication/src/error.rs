//! Errors raised while loading, upgrading, patching and packaging
//! environment states.

use thiserror::Error;

use ob_core::CoreError;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum PublicationError {
    /// An upgrader was handed a state of the wrong schema version.
    #[error("Unexpected state provided")]
    UnexpectedState,

    #[error("unknown state schema version {0}")]
    UnknownSchemaVersion(u32),

    #[error("no upgrader registered for state schema version {0}")]
    MissingUpgrader(u32),

    #[error("Unknown `ow_type` '{0}'")]
    UnknownOwType(String),

    #[error("malformed OW object '{ow_id}': {reason}")]
    MalformedOwObject { ow_id: String, reason: String },

    #[error("Unable to find asset uuid in the name: '{0}'")]
    AssetName(String),

    #[error("invalid XML: {0}")]
    Xml(String),

    #[error("report is missing required element {0}")]
    MissingReportElement(&'static str),

    #[error("Regeling vrijetekst bestaat niet")]
    MissingActText,

    #[error("Merging werkingsgebieden.Locations is not implemented yet")]
    MergingLocations,

    #[error("Duplicate filenames just for different `documents`")]
    DuplicateDocumentFilenames,

    #[error("Missing area for werkingsgebied with code: {0}")]
    MissingArea(String),

    #[error("Missing file for document with code: {0}")]
    MissingFile(String),

    #[error("Can not create new state")]
    NoSourceState,

    #[error("publication data not found while upgrading state1 to state2: {0}")]
    MissingPublicationData(String),

    #[error("AOJ.UUID does not match with original data")]
    AreaOfJurisdictionMismatch,

    #[error("asset {0} could not be resolved")]
    MissingAsset(String),

    #[error("Error(s) found while validating publication")]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("state serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
