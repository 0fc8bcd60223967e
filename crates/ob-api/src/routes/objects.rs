//! # Object API
//!
//! Object codes are allocated per object type from a monotonic sequence
//! (`beleidskeuze-1`, `beleidskeuze-2`, ...) and never reused. Durable
//! object versions only come into existence through module completion;
//! this module exposes the registry and the currently valid set.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use ob_core::ObjectCode;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_text, Validate};
use crate::state::{AppState, ObjectRecord, ObjectStaticRecord};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateObjectStaticRequest {
    pub object_type: String,
}

impl Validate for CreateObjectStaticRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("object_type", &self.object_type, 64)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ValidObjectsQuery {
    /// Moment to evaluate validity at; defaults to now.
    pub at: Option<DateTime<Utc>>,
    pub object_type: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/objects/statics",
            get(list_object_statics).post(create_object_static),
        )
        .route("/v1/objects/valid", get(list_valid_objects))
        .route("/v1/objects/{code}", get(get_object_versions))
}

/// Allocate the next code for `object_type`.
pub(crate) fn allocate_code(
    state: &AppState,
    object_type: &str,
) -> Result<ObjectStaticRecord, AppError> {
    let code = ObjectCode::new(object_type, state.next_id(&format!("object:{object_type}")))?;
    let record = ObjectStaticRecord {
        uuid: Uuid::new_v4(),
        code: code.to_string(),
        object_type: code.object_type().to_string(),
        object_id: code.object_id(),
        created_at: Utc::now(),
    };
    state.object_statics.insert(record.uuid, record.clone());
    tracing::debug!(code = %record.code, "object code allocated");
    Ok(record)
}

/// POST /v1/objects/statics: Allocate an object code.
#[utoipa::path(
    post,
    path = "/v1/objects/statics",
    request_body = CreateObjectStaticRequest,
    responses(
        (status = 201, description = "Code allocated", body = ObjectStaticRecord),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "objects"
)]
async fn create_object_static(
    State(state): State<AppState>,
    body: Result<Json<CreateObjectStaticRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ObjectStaticRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let record = allocate_code(&state, &req.object_type)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/objects/statics: List allocated codes.
#[utoipa::path(
    get,
    path = "/v1/objects/statics",
    responses(
        (status = 200, description = "Allocated codes", body = Vec<ObjectStaticRecord>),
    ),
    tag = "objects"
)]
async fn list_object_statics(State(state): State<AppState>) -> Json<Vec<ObjectStaticRecord>> {
    let mut all = state.object_statics.list();
    all.sort_by(|a, b| {
        a.object_type
            .cmp(&b.object_type)
            .then(a.object_id.cmp(&b.object_id))
    });
    Json(all)
}

/// GET /v1/objects/valid: Newest valid version of each object.
#[utoipa::path(
    get,
    path = "/v1/objects/valid",
    params(ValidObjectsQuery),
    responses(
        (status = 200, description = "Valid objects", body = Vec<ObjectRecord>),
    ),
    tag = "objects"
)]
async fn list_valid_objects(
    State(state): State<AppState>,
    Query(query): Query<ValidObjectsQuery>,
) -> Json<Vec<ObjectRecord>> {
    let mut objects = state.valid_objects(query.at.unwrap_or_else(Utc::now));
    if let Some(object_type) = &query.object_type {
        objects.retain(|o| &o.object_type == object_type);
    }
    objects.sort_by(|a, b| a.code.cmp(&b.code));
    Json(objects)
}

/// GET /v1/objects/{code}: All durable versions of one object, oldest first.
#[utoipa::path(
    get,
    path = "/v1/objects/{code}",
    params(("code" = String, Path, description = "Object code, e.g. beleidskeuze-12")),
    responses(
        (status = 200, description = "Object versions", body = Vec<ObjectRecord>),
        (status = 404, description = "Unknown code", body = crate::error::ErrorBody),
    ),
    tag = "objects"
)]
async fn get_object_versions(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<ObjectRecord>>, AppError> {
    let code = ObjectCode::parse(&code)?.to_string();
    if state.object_statics.filter(|s| s.code == code).is_empty() {
        return Err(AppError::NotFound(format!("object {code} not found")));
    }
    let mut versions = state.objects.filter(|o| o.code == code);
    versions.sort_by(|a, b| {
        a.start_validity
            .cmp(&b.start_validity)
            .then(a.created_at.cmp(&b.created_at))
    });
    Ok(Json(versions))
}
