//! # API Route Modules
//!
//! Route modules for the publication API surface:
//!
//! - `modules`: module lifecycle (activate, lock, status, complete, close)
//!   and the object versions a module carries.
//! - `objects`: object code registry and the currently valid objects.
//! - `environments`: publication environments and their state chain.
//! - `publications`: acts, publications and publication versions.
//! - `packages`: act packages, LVBB report upload and abort.
//! - `announcements`: announcements and announcement packages.
//! - `registry`: assets and areas of jurisdiction referenced by packages.

pub mod announcements;
pub mod environments;
pub mod modules;
pub mod objects;
pub mod packages;
pub mod publications;
pub mod registry;

use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::packaging::Changes;
use crate::state::AppState;

/// Pagination parameters for list endpoints.
#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct PaginationParams {
    /// Maximum number of items to return (default: 100, max: 1000).
    pub limit: Option<usize>,
    /// Number of items to skip (default: 0).
    pub offset: Option<usize>,
}

impl PaginationParams {
    const DEFAULT_LIMIT: usize = 100;
    const MAX_LIMIT: usize = 1000;

    fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }

    fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Apply to an already sorted list.
    pub fn page<T>(&self, all: Vec<T>) -> Vec<T> {
        let offset = self.effective_offset().min(all.len());
        all.into_iter()
            .skip(offset)
            .take(self.effective_limit())
            .collect()
    }
}

/// Write environment and state changes through to the database.
///
/// Failure is surfaced to the client: the in-memory chain would otherwise
/// diverge from what survives a restart.
pub(crate) async fn persist_changes(state: &AppState, changes: &Changes) -> Result<(), AppError> {
    let Some(pool) = &state.db_pool else {
        return Ok(());
    };

    if let Some(environment) = &changes.environment {
        if let Err(e) = crate::db::environments::upsert(pool, environment).await {
            tracing::error!(environment = %environment.id, error = %e, "failed to persist environment");
            return Err(AppError::Internal(
                "environment updated in-memory but database persist failed".to_string(),
            ));
        }
    }
    if let Some(record) = &changes.new_state {
        if let Err(e) = crate::db::states::insert(pool, record).await {
            tracing::error!(state = %record.uuid, error = %e, "failed to persist environment state");
            return Err(AppError::Internal(
                "state recorded in-memory but database persist failed".to_string(),
            ));
        }
    }
    if let Some(record) = &changes.activated_state {
        if let Err(e) = crate::db::states::set_activation(
            pool,
            record.uuid,
            record.is_activated,
            record.activated_at,
        )
        .await
        {
            tracing::error!(state = %record.uuid, error = %e, "failed to persist state activation");
            return Err(AppError::Internal(
                "state activation recorded in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.effective_limit(), 100);
        assert_eq!(params.effective_offset(), 0);
    }

    #[test]
    fn pagination_caps_limit() {
        let params = PaginationParams {
            limit: Some(5000),
            offset: None,
        };
        assert_eq!(params.effective_limit(), 1000);
    }

    #[test]
    fn page_skips_and_takes() {
        let params = PaginationParams {
            limit: Some(2),
            offset: Some(1),
        };
        assert_eq!(params.page(vec![1, 2, 3, 4]), vec![2, 3]);
        let past_end = PaginationParams {
            limit: None,
            offset: Some(10),
        };
        assert!(past_end.page(vec![1, 2]).is_empty());
    }
}
