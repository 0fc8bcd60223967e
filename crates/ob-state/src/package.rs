//! # Act Package Status
//!
//! An act package is one generated delivery (validation or publication) of a
//! publication version. Its report status starts `pending` on a stateful
//! environment and is settled by the LVBB reports uploaded for it.
//!
//! ```text
//! pending ──report succes + outcome──▶ valid ──abort──▶ aborted
//!    │
//!    └──────report failure─────────▶ failed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ob_core::{ProcedureType, StateId};

/// Packages older than this many days are not aborted.
pub const ABORT_WINDOW_DAYS: i64 = 30;

// ─── Enums ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageType {
    Validation,
    Publication,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "Validation",
            Self::Publication => "Publication",
        }
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Valid,
    Failed,
    Aborted,
    NotApplicable,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
            Self::NotApplicable => "not_applicable",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationVersionStatus {
    Active,
    Validation,
    ValidationFailed,
    Publication,
    PublicationFailed,
    PublicationAborted,
    Announcement,
    Completed,
    NotApplicable,
}

impl PublicationVersionStatus {
    /// Status a version takes when a package of `package_type` is created.
    pub fn for_package(package_type: PackageType) -> Self {
        match package_type {
            PackageType::Validation => Self::Validation,
            PackageType::Publication => Self::Publication,
        }
    }

    /// Status a version takes when a package of `package_type` fails.
    pub fn failed_for(package_type: PackageType) -> Self {
        match package_type {
            PackageType::Validation => Self::ValidationFailed,
            PackageType::Publication => Self::PublicationFailed,
        }
    }

    /// Status after a valid report, if it changes at all.
    ///
    /// A published final procedure completes the version.
    pub fn after_valid(package_type: PackageType, procedure: ProcedureType) -> Option<Self> {
        match (package_type, procedure) {
            (PackageType::Publication, ProcedureType::Final) => Some(Self::Completed),
            _ => None,
        }
    }
}

// ─── Report resolution ──────────────────────────────────────────────

/// One parsed LVBB report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub status: ReportStatus,
    pub main_outcome: String,
    pub sub_delivery_id: String,
    pub sub_progress: String,
    pub sub_outcome: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningStatus {
    pub status: ReportStatus,
    pub is_conclusive: bool,
}

impl RunningStatus {
    /// The status to apply to the package, if the reports settled it to
    /// something other than `starting`.
    pub fn settled_change(&self, starting: ReportStatus) -> Option<ReportStatus> {
        if self.status == starting || !self.is_conclusive {
            return None;
        }
        Some(self.status)
    }
}

/// Fold newly uploaded reports into the package's running status.
///
/// A package that already failed stays failed. Otherwise each failed report,
/// and each valid report carrying a sub outcome, settles the running status;
/// the last settling report wins.
pub fn resolve_report_status(current: ReportStatus, reports: &[ReportOutcome]) -> RunningStatus {
    let mut running = RunningStatus {
        status: current,
        is_conclusive: false,
    };
    for report in reports {
        if current == ReportStatus::Failed || report.status == ReportStatus::Failed {
            running = RunningStatus {
                status: ReportStatus::Failed,
                is_conclusive: true,
            };
        } else if report.status == ReportStatus::Valid && !report.sub_outcome.is_empty() {
            running = RunningStatus {
                status: ReportStatus::Valid,
                is_conclusive: true,
            };
        }
    }
    running
}

// ─── Abort ──────────────────────────────────────────────────────────

/// Abort refusals, each tied to the HTTP status the API answers with.
#[derive(Error, Debug, PartialEq)]
pub enum AbortError {
    #[error("Are you sure you want to abort this publication?")]
    NotConfirmed,

    #[error("You can only abort packages which are successfull")]
    NotValid,

    #[error("Only publications can be aborted")]
    NotPublication,

    #[error("We do not know what to do if we do not have state uuids")]
    MissingStates,

    #[error("Too many days has passed since creation of the package. Its unlikely that you want to abort this")]
    TooOld,

    #[error("We can only abort the latest package in the state chain")]
    NotLatest,
}

impl AbortError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotConfirmed => 450,
            Self::NotValid => 406,
            Self::NotPublication => 451,
            Self::MissingStates => 500,
            Self::TooOld | Self::NotLatest => 452,
        }
    }
}

/// The package facts an abort decision needs.
#[derive(Debug, Clone)]
pub struct AbortRequest {
    pub confirm: bool,
    pub report_status: ReportStatus,
    pub package_type: PackageType,
    pub used_state: Option<StateId>,
    pub created_state: Option<StateId>,
    pub created_at: DateTime<Utc>,
    pub environment_active_state: Option<StateId>,
}

/// Ordered abort checks. On success yields the state to restore.
pub struct AbortGuard;

impl AbortGuard {
    pub fn check(request: &AbortRequest, now: DateTime<Utc>) -> Result<StateId, AbortError> {
        if !request.confirm {
            return Err(AbortError::NotConfirmed);
        }
        if request.report_status != ReportStatus::Valid {
            return Err(AbortError::NotValid);
        }
        if request.package_type != PackageType::Publication {
            return Err(AbortError::NotPublication);
        }
        let (Some(used), Some(created)) = (request.used_state, request.created_state) else {
            return Err(AbortError::MissingStates);
        };
        let days = (now.date_naive() - request.created_at.date_naive()).num_days();
        if days > ABORT_WINDOW_DAYS {
            return Err(AbortError::TooOld);
        }
        if request.environment_active_state != Some(created) {
            return Err(AbortError::NotLatest);
        }
        Ok(used)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
