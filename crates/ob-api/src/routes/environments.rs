//! # Publication Environment API
//!
//! Environments are the LVBB targets (pre-production, production) a
//! province publishes to. A stateful environment carries a chain of
//! consolidated state snapshots; it is created with an empty, activated
//! snapshot so every package has a state to build on.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use ob_core::StateId;
use ob_publication::StateV5;
use ob_state::Environment;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_text, Validate};
use crate::state::{AppState, EnvironmentStateRecord};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEnvironmentRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub code: Option<String>,
    /// Province FRBR code, e.g. `pv28`.
    pub province_id: String,
    #[serde(default)]
    pub authority_id: String,
    #[serde(default)]
    pub submitter_id: String,
    pub governing_body_type: Option<String>,
    pub frbr_country: Option<String>,
    pub frbr_language: Option<String>,
    pub has_state: bool,
    #[serde(default = "default_true")]
    pub can_validate: bool,
    #[serde(default = "default_true")]
    pub can_publicate: bool,
}

fn default_true() -> bool {
    true
}

impl Validate for CreateEnvironmentRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title, 255)?;
        require_text("province_id", &self.province_id, 32)?;
        if !self.can_validate && !self.can_publicate {
            return Err("an environment must allow validation or publication".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, serde::Serialize, Deserialize, ToSchema)]
pub struct EnvironmentResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub code: Option<String>,
    pub province_id: String,
    pub authority_id: String,
    pub submitter_id: String,
    pub governing_body_type: String,
    pub frbr_country: String,
    pub frbr_language: String,
    pub has_state: bool,
    pub can_validate: bool,
    pub can_publicate: bool,
    pub is_active: bool,
    pub is_locked: bool,
    pub active_state: Option<Uuid>,
    pub created_at: chrono::DateTime<Utc>,
    pub modified_at: chrono::DateTime<Utc>,
}

impl From<&Environment> for EnvironmentResponse {
    fn from(e: &Environment) -> Self {
        Self {
            id: e.id.0,
            title: e.title.clone(),
            description: e.description.clone(),
            code: e.code.clone(),
            province_id: e.province_id.clone(),
            authority_id: e.authority_id.clone(),
            submitter_id: e.submitter_id.clone(),
            governing_body_type: e.governing_body_type.clone(),
            frbr_country: e.frbr_country.clone(),
            frbr_language: e.frbr_language.clone(),
            has_state: e.has_state,
            can_validate: e.can_validate,
            can_publicate: e.can_publicate,
            is_active: e.is_active,
            is_locked: e.is_locked,
            active_state: e.active_state.map(|s| s.0),
            created_at: e.created_at,
            modified_at: e.modified_at,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/environments",
            get(list_environments).post(create_environment),
        )
        .route("/v1/environments/{id}", get(get_environment))
        .route("/v1/environments/{id}/states", get(list_states))
        .route("/v1/environments/{id}/active-state", get(get_active_state))
}

fn find_environment(state: &AppState, id: Uuid) -> Result<Environment, AppError> {
    state
        .environments
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("environment {id} not found")))
}

/// POST /v1/environments: Create a publication environment.
#[utoipa::path(
    post,
    path = "/v1/environments",
    request_body = CreateEnvironmentRequest,
    responses(
        (status = 201, description = "Environment created", body = EnvironmentResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "environments"
)]
async fn create_environment(
    State(state): State<AppState>,
    body: Result<Json<CreateEnvironmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EnvironmentResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let mut environment = Environment::new(req.title, req.province_id, req.has_state);
    environment.description = req.description;
    environment.code = req.code;
    environment.authority_id = req.authority_id;
    environment.submitter_id = req.submitter_id;
    if let Some(v) = req.governing_body_type {
        environment.governing_body_type = v;
    }
    if let Some(v) = req.frbr_country {
        environment.frbr_country = v;
    }
    if let Some(v) = req.frbr_language {
        environment.frbr_language = v;
    }
    environment.can_validate = req.can_validate;
    environment.can_publicate = req.can_publicate;

    let initial = if environment.has_state {
        let mut record =
            EnvironmentStateRecord::new(environment.id, None, StateV5::default().to_stored()?);
        record.is_activated = true;
        record.activated_at = Some(record.created_at);
        environment.active_state = Some(StateId(record.uuid));
        Some(record)
    } else {
        None
    };

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::environments::upsert(pool, &environment).await {
            tracing::error!(environment = %environment.id, error = %e, "failed to persist environment");
            return Err(AppError::Internal("database persist failed".to_string()));
        }
        if let Some(record) = &initial {
            if let Err(e) = crate::db::states::insert(pool, record).await {
                tracing::error!(state = %record.uuid, error = %e, "failed to persist initial state");
                return Err(AppError::Internal("database persist failed".to_string()));
            }
        }
    }

    if let Some(record) = initial {
        state.states.insert(record.uuid, record);
    }
    state
        .environments
        .insert(environment.id.0, environment.clone());
    tracing::info!(
        environment = %environment.id,
        has_state = environment.has_state,
        "publication environment created"
    );
    Ok((StatusCode::CREATED, Json(EnvironmentResponse::from(&environment))))
}

/// GET /v1/environments: List environments.
#[utoipa::path(
    get,
    path = "/v1/environments",
    responses(
        (status = 200, description = "Environments", body = Vec<EnvironmentResponse>),
    ),
    tag = "environments"
)]
async fn list_environments(State(state): State<AppState>) -> Json<Vec<EnvironmentResponse>> {
    let mut all = state.environments.list();
    all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(all.iter().map(EnvironmentResponse::from).collect())
}

/// GET /v1/environments/{id}: Get an environment.
#[utoipa::path(
    get,
    path = "/v1/environments/{id}",
    params(("id" = Uuid, Path, description = "Environment ID")),
    responses(
        (status = 200, description = "Environment found", body = EnvironmentResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "environments"
)]
async fn get_environment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EnvironmentResponse>, AppError> {
    let environment = find_environment(&state, id)?;
    Ok(Json(EnvironmentResponse::from(&environment)))
}

/// GET /v1/environments/{id}/states: State snapshots, oldest first.
#[utoipa::path(
    get,
    path = "/v1/environments/{id}/states",
    params(("id" = Uuid, Path, description = "Environment ID")),
    responses(
        (status = 200, description = "State snapshots", body = Vec<EnvironmentStateRecord>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "environments"
)]
async fn list_states(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EnvironmentStateRecord>>, AppError> {
    find_environment(&state, id)?;
    let mut states = state.states.filter(|s| s.environment_id == id);
    states.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(states))
}

/// GET /v1/environments/{id}/active-state: Active state in the current schema.
///
/// Older snapshots are upgraded on the fly; the stored row is not rewritten.
#[utoipa::path(
    get,
    path = "/v1/environments/{id}/active-state",
    params(("id" = Uuid, Path, description = "Environment ID")),
    responses(
        (status = 200, description = "Active state in the current schema", content_type = "application/json"),
        (status = 404, description = "Environment not found or stateless", body = crate::error::ErrorBody),
    ),
    tag = "environments"
)]
async fn get_active_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StateV5>, AppError> {
    let environment = find_environment(&state, id)?;
    state
        .load_active_state(&environment)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("environment {id} has no active state")))
}
