//! # Act and Publication API
//!
//! An act is the FRBR work an environment publishes expressions of. A
//! publication binds an act to a text template; each publication version
//! selects the objects (optionally overlaid by a module) and the
//! effective date that a package is built from.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use ob_core::{DocumentType, ProcedureType};
use ob_state::PublicationVersionStatus;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, require_text, Validate};
use crate::state::{ActRecord, AppState, PublicationRecord, PublicationVersionRecord};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateActRequest {
    pub environment_id: Uuid,
    #[schema(value_type = String)]
    pub document_type: DocumentType,
    #[schema(value_type = String)]
    pub procedure_type: ProcedureType,
    pub title: String,
    /// FRBR work "other" part; defaults to `{document_type}-{act_id}`.
    pub work_other: Option<String>,
}

impl Validate for CreateActRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title, 255)?;
        if let Some(work_other) = &self.work_other {
            require_text("work_other", work_other, 128)?;
            if !work_other
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err("work_other may only contain letters, digits, '-' and '_'".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePublicationRequest {
    pub act_id: Uuid,
    pub title: String,
    /// Text with `<object code="..."/>` placeholders.
    pub template: String,
}

impl Validate for CreatePublicationRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title, 255)?;
        require_text("template", &self.template, 1_000_000)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateVersionRequest {
    pub module_id: Option<Uuid>,
    pub effective_date: Option<NaiveDate>,
    pub announcement_date: Option<NaiveDate>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/acts", get(list_acts).post(create_act))
        .route("/v1/acts/{id}", get(get_act))
        .route("/v1/acts/{id}/deactivate", post(deactivate_act))
        .route("/v1/publications", get(list_publications).post(create_publication))
        .route(
            "/v1/publications/{id}/versions",
            get(list_versions).post(create_version),
        )
        .route("/v1/versions/{id}", get(get_version))
}

/// POST /v1/acts: Register an act in an environment.
#[utoipa::path(
    post,
    path = "/v1/acts",
    request_body = CreateActRequest,
    responses(
        (status = 201, description = "Act created", body = ActRecord),
        (status = 404, description = "Environment not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "publications"
)]
async fn create_act(
    State(state): State<AppState>,
    body: Result<Json<CreateActRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ActRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let environment = state.environments.get(&req.environment_id).ok_or_else(|| {
        AppError::NotFound(format!("environment {} not found", req.environment_id))
    })?;

    let act_id = state.next_id("act");
    let act = ActRecord {
        uuid: Uuid::new_v4(),
        environment_id: environment.id.0,
        document_type: req.document_type,
        procedure_type: req.procedure_type,
        act_id,
        title: req.title,
        work_province_id: environment.province_id.clone(),
        work_country: environment.frbr_country.clone(),
        work_date: Utc::now().year().to_string(),
        work_other: req
            .work_other
            .unwrap_or_else(|| format!("{}-{act_id}", req.document_type.as_str())),
        is_active: true,
        versions: Vec::new(),
        created_at: Utc::now(),
    };
    state.acts.insert(act.uuid, act.clone());
    tracing::info!(act = %act.uuid, work_other = %act.work_other, "act created");
    Ok((StatusCode::CREATED, Json(act)))
}

/// GET /v1/acts: List acts.
#[utoipa::path(
    get,
    path = "/v1/acts",
    responses((status = 200, description = "Acts", body = Vec<ActRecord>)),
    tag = "publications"
)]
async fn list_acts(State(state): State<AppState>) -> Json<Vec<ActRecord>> {
    let mut all = state.acts.list();
    all.sort_by_key(|a| a.act_id);
    Json(all)
}

/// GET /v1/acts/{id}: Get an act with the expressions delivered so far.
#[utoipa::path(
    get,
    path = "/v1/acts/{id}",
    params(("id" = Uuid, Path, description = "Act ID")),
    responses(
        (status = 200, description = "Act found", body = ActRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "publications"
)]
async fn get_act(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActRecord>, AppError> {
    state
        .acts
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("act {id} not found")))
}

/// POST /v1/acts/{id}/deactivate: Stop using an act for new packages.
#[utoipa::path(
    post,
    path = "/v1/acts/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Act ID")),
    responses(
        (status = 200, description = "Act deactivated", body = ActRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "publications"
)]
async fn deactivate_act(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActRecord>, AppError> {
    let act = state
        .acts
        .update(&id, |act| act.is_active = false)
        .ok_or_else(|| AppError::NotFound(format!("act {id} not found")))?;
    tracing::info!(act = %id, "act deactivated");
    Ok(Json(act))
}

/// POST /v1/publications: Create a publication for an act.
#[utoipa::path(
    post,
    path = "/v1/publications",
    request_body = CreatePublicationRequest,
    responses(
        (status = 201, description = "Publication created", body = PublicationRecord),
        (status = 404, description = "Act not found", body = crate::error::ErrorBody),
        (status = 409, description = "Act inactive", body = crate::error::ErrorBody),
    ),
    tag = "publications"
)]
async fn create_publication(
    State(state): State<AppState>,
    body: Result<Json<CreatePublicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicationRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let act = state
        .acts
        .get(&req.act_id)
        .ok_or_else(|| AppError::NotFound(format!("act {} not found", req.act_id)))?;
    if !act.is_active {
        return Err(AppError::Conflict("This act can no longer be used".to_string()));
    }

    let publication = PublicationRecord {
        uuid: Uuid::new_v4(),
        environment_id: act.environment_id,
        act_id: act.uuid,
        document_type: act.document_type,
        procedure_type: act.procedure_type,
        title: req.title,
        template: req.template,
        created_at: Utc::now(),
    };
    state
        .publications
        .insert(publication.uuid, publication.clone());
    Ok((StatusCode::CREATED, Json(publication)))
}

/// GET /v1/publications: List publications.
#[utoipa::path(
    get,
    path = "/v1/publications",
    responses((status = 200, description = "Publications", body = Vec<PublicationRecord>)),
    tag = "publications"
)]
async fn list_publications(State(state): State<AppState>) -> Json<Vec<PublicationRecord>> {
    let mut all = state.publications.list();
    all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(all)
}

/// POST /v1/publications/{id}/versions: Start a publication version.
#[utoipa::path(
    post,
    path = "/v1/publications/{id}/versions",
    params(("id" = Uuid, Path, description = "Publication ID")),
    request_body = CreateVersionRequest,
    responses(
        (status = 201, description = "Version created", body = PublicationVersionRecord),
        (status = 404, description = "Publication or module not found", body = crate::error::ErrorBody),
    ),
    tag = "publications"
)]
async fn create_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CreateVersionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicationVersionRecord>), AppError> {
    let req = extract_json(body)?;
    if !state.publications.contains(&id) {
        return Err(AppError::NotFound(format!("publication {id} not found")));
    }
    if let Some(module_id) = req.module_id {
        if !state.modules.contains(&module_id) {
            return Err(AppError::NotFound(format!("module {module_id} not found")));
        }
    }

    let now = Utc::now();
    let version = PublicationVersionRecord {
        uuid: Uuid::new_v4(),
        publication_id: id,
        module_id: req.module_id,
        effective_date: req.effective_date,
        announcement_date: req.announcement_date,
        status: PublicationVersionStatus::Active,
        is_locked: false,
        created_at: now,
        modified_at: now,
    };
    state.versions.insert(version.uuid, version.clone());
    Ok((StatusCode::CREATED, Json(version)))
}

/// GET /v1/publications/{id}/versions: Versions of a publication, oldest first.
#[utoipa::path(
    get,
    path = "/v1/publications/{id}/versions",
    params(("id" = Uuid, Path, description = "Publication ID")),
    responses(
        (status = 200, description = "Versions", body = Vec<PublicationVersionRecord>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "publications"
)]
async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PublicationVersionRecord>>, AppError> {
    if !state.publications.contains(&id) {
        return Err(AppError::NotFound(format!("publication {id} not found")));
    }
    let mut versions = state.versions.filter(|v| v.publication_id == id);
    versions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(versions))
}

/// GET /v1/versions/{id}: Get a publication version.
#[utoipa::path(
    get,
    path = "/v1/versions/{id}",
    params(("id" = Uuid, Path, description = "Publication version ID")),
    responses(
        (status = 200, description = "Version found", body = PublicationVersionRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "publications"
)]
async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicationVersionRecord>, AppError> {
    state
        .versions
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("publication version {id} not found")))
}
