//! # ob-core: Foundational Types for the Publication Stack
//!
//! Defines the value types every other `ob-*` crate builds on: FRBR legal
//! citation identifiers, immutable object codes, consolidation purposes,
//! content digests, and the date formatting used in STOP/TPOD identifiers.
//! Depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ModuleId`, `EnvironmentId`,
//!    `StateId`, `PackageId` wrap a `Uuid`; `ObjectCode` wraps the
//!    `"{object_type}-{object_id}"` string and is validated on construction.
//!
//! 2. **One FRBR value type.** `Frbr` carries the seven work/expression
//!    fields. The document kind (`WorkKind`) decides how the work path is
//!    rendered, so an act and its bill share the same field layout.
//!
//! 3. **Stored field names are preserved.** Types that are persisted inside
//!    environment state snapshots serialize with their historical names
//!    (`Work_Province_ID`, `Expression_Version`, ...). Renaming a Rust field
//!    never changes the snapshot format.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ob-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod domain;
pub mod error;
pub mod frbr;
pub mod identity;
pub mod temporal;

pub use digest::{sha256_hex, sha512_hex};
pub use domain::{DocumentType, ProcedureType, PurposeType};
pub use error::CoreError;
pub use frbr::{ActFrbr, Frbr, Purpose, WorkKind};
pub use identity::{EnvironmentId, ModuleId, ObjectCode, PackageId, StateId};
pub use temporal::{format_date, parse_date, today, today_str};
