//! # ob-state: Lifecycle State Machines
//!
//! Guarded transitions over the records that drive publication. Every
//! machine validates the move before mutating, and rejects an illegal move
//! with a structured error naming the current state and the attempted one.
//!
//! ## State Machines
//!
//! - **Module** (`module.rs`): activation, temporary locking, status
//!   history, completion into durable objects, and closing.
//!
//! - **Environment** (`environment.rs`): the publication environment lock
//!   and the optimistic state chain (`adjust_on` must equal the active
//!   state).
//!
//! - **Package** (`package.rs`): package and report status enums, report
//!   status resolution, and the abort guard.
//!
//! Nothing here touches storage. The API layer loads a record, calls the
//! transition inside a store update closure, and persists the result.

pub mod environment;
pub mod module;
pub mod package;

// ─── Module re-exports ──────────────────────────────────────────────

pub use module::{
    object_validity, Module, ModuleError, ModuleObjectAction, ModuleStatus, ModuleStatusCode,
};

// ─── Environment re-exports ─────────────────────────────────────────

pub use environment::{Environment, EnvironmentError};

// ─── Package re-exports ─────────────────────────────────────────────

pub use package::{
    resolve_report_status, AbortError, AbortGuard, AbortRequest, PackageType,
    PublicationVersionStatus, ReportOutcome, ReportStatus, RunningStatus, ABORT_WINDOW_DAYS,
};
