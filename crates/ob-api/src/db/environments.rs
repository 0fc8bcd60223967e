//! Publication environment persistence.
//!
//! Lock and chain rules live in `ob_state::Environment`; the table only
//! mirrors the record after each transition.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ob_core::{EnvironmentId, StateId};
use ob_state::Environment;

/// Insert or replace an environment.
pub async fn upsert(pool: &PgPool, env: &Environment) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO publication_environments (
             id, title, description, code, province_id, authority_id, submitter_id,
             governing_body_type, frbr_country, frbr_language, has_state, can_validate,
             can_publicate, is_active, is_locked, active_state, created_at, modified_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
         ON CONFLICT (id) DO UPDATE SET
             title = EXCLUDED.title,
             description = EXCLUDED.description,
             code = EXCLUDED.code,
             authority_id = EXCLUDED.authority_id,
             submitter_id = EXCLUDED.submitter_id,
             governing_body_type = EXCLUDED.governing_body_type,
             can_validate = EXCLUDED.can_validate,
             can_publicate = EXCLUDED.can_publicate,
             is_active = EXCLUDED.is_active,
             is_locked = EXCLUDED.is_locked,
             active_state = EXCLUDED.active_state,
             modified_at = EXCLUDED.modified_at",
    )
    .bind(env.id.0)
    .bind(&env.title)
    .bind(&env.description)
    .bind(&env.code)
    .bind(&env.province_id)
    .bind(&env.authority_id)
    .bind(&env.submitter_id)
    .bind(&env.governing_body_type)
    .bind(&env.frbr_country)
    .bind(&env.frbr_language)
    .bind(env.has_state)
    .bind(env.can_validate)
    .bind(env.can_publicate)
    .bind(env.is_active)
    .bind(env.is_locked)
    .bind(env.active_state.map(|s| s.0))
    .bind(env.created_at)
    .bind(env.modified_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all environments on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Environment>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EnvironmentRow>(
        "SELECT id, title, description, code, province_id, authority_id, submitter_id,
                governing_body_type, frbr_country, frbr_language, has_state, can_validate,
                can_publicate, is_active, is_locked, active_state, created_at, modified_at
         FROM publication_environments ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(EnvironmentRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct EnvironmentRow {
    id: Uuid,
    title: String,
    description: String,
    code: Option<String>,
    province_id: String,
    authority_id: String,
    submitter_id: String,
    governing_body_type: String,
    frbr_country: String,
    frbr_language: String,
    has_state: bool,
    can_validate: bool,
    can_publicate: bool,
    is_active: bool,
    is_locked: bool,
    active_state: Option<Uuid>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl EnvironmentRow {
    fn into_record(self) -> Environment {
        Environment {
            id: EnvironmentId(self.id),
            title: self.title,
            description: self.description,
            code: self.code,
            province_id: self.province_id,
            authority_id: self.authority_id,
            submitter_id: self.submitter_id,
            governing_body_type: self.governing_body_type,
            frbr_country: self.frbr_country,
            frbr_language: self.frbr_language,
            has_state: self.has_state,
            can_validate: self.can_validate,
            can_publicate: self.can_publicate,
            is_active: self.is_active,
            is_locked: self.is_locked,
            active_state: self.active_state.map(StateId),
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }
}
