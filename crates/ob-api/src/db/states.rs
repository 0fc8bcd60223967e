//! Environment state snapshot persistence.
//!
//! Snapshots are stored in the schema version they were written with and
//! upgraded on read by `ob_publication::StateLoader`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::EnvironmentStateRecord;

/// Insert a new snapshot.
pub async fn insert(pool: &PgPool, record: &EnvironmentStateRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO publication_environment_states
             (id, environment_id, adjust_on, schema_version, state, is_activated, activated_at, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.uuid)
    .bind(record.environment_id)
    .bind(record.adjust_on)
    .bind(record.schema_version as i32)
    .bind(&record.state)
    .bind(record.is_activated)
    .bind(record.activated_at)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update the activation flags of a snapshot.
pub async fn set_activation(
    pool: &PgPool,
    id: Uuid,
    is_activated: bool,
    activated_at: Option<DateTime<Utc>>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE publication_environment_states
         SET is_activated = $1, activated_at = $2 WHERE id = $3",
    )
    .bind(is_activated)
    .bind(activated_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all snapshots on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<EnvironmentStateRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StateRow>(
        "SELECT id, environment_id, adjust_on, schema_version, state, is_activated, activated_at, created_at
         FROM publication_environment_states ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StateRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct StateRow {
    id: Uuid,
    environment_id: Uuid,
    adjust_on: Option<Uuid>,
    schema_version: i32,
    state: serde_json::Value,
    is_activated: bool,
    activated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl StateRow {
    fn into_record(self) -> EnvironmentStateRecord {
        let schema_version = u32::try_from(self.schema_version).unwrap_or_else(|_| {
            tracing::warn!(
                id = %self.id,
                schema_version = self.schema_version,
                "negative schema version in database, loading as 0"
            );
            0
        });
        EnvironmentStateRecord {
            uuid: self.id,
            environment_id: self.environment_id,
            adjust_on: self.adjust_on,
            schema_version,
            state: self.state,
            is_activated: self.is_activated,
            activated_at: self.activated_at,
            created_at: self.created_at,
        }
    }
}
