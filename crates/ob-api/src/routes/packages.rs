//! # Act Package API
//!
//! Thin handlers over [`crate::packaging`]: they parse the request, run
//! the orchestration and write the touched environment and state rows
//! through to Postgres. `/v1/packages` lists act and announcement packages
//! together.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use ob_state::PackageType;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::packaging::{
    abort_act_package, create_act_package, unified_packages, upload_act_reports,
    validate_act_package, AbortResponse, PackageCreatedResponse, PackageFilter,
    ReportUploadResponse, UnifiedPackage, UploadedReport,
};
use crate::routes::{persist_changes, PaginationParams};
use crate::state::{ActPackageRecord, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePackageRequest {
    /// `Validation` or `Publication`.
    #[schema(value_type = String)]
    pub package_type: PackageType,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadReportsRequest {
    pub files: Vec<UploadedReport>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AbortParams {
    /// Must be `true`; an unconfirmed abort answers 450.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PackagePage {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub results: Vec<UnifiedPackage>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/packages", get(list_packages))
        .route("/v1/versions/{id}/validate", get(validate_version))
        .route(
            "/v1/versions/{id}/act-packages",
            get(list_act_packages).post(create_package),
        )
        .route("/v1/act-packages/{id}", get(get_act_package))
        .route("/v1/act-packages/{id}/report", post(upload_reports))
        .route("/v1/act-packages/{id}/abort", post(abort_package))
}

/// POST /v1/versions/{id}/act-packages: Build an act package.
#[utoipa::path(
    post,
    path = "/v1/versions/{id}/act-packages",
    params(("id" = Uuid, Path, description = "Publication version ID")),
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Package created", body = PackageCreatedResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Environment or version locked, or package type disabled", body = crate::error::ErrorBody),
        (status = 441, description = "Publication input invalid", body = crate::error::ErrorBody),
    ),
    tag = "packages"
)]
async fn create_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CreatePackageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PackageCreatedResponse>), AppError> {
    let req = extract_json(body)?;
    let (package, changes) = create_act_package(&state, id, req.package_type)?;
    persist_changes(&state, &changes).await?;
    Ok((
        StatusCode::CREATED,
        Json(PackageCreatedResponse {
            package_uuid: package.uuid,
            zip_filename: package.zip.filename,
            zip_checksum: package.zip.checksum,
        }),
    ))
}

/// GET /v1/versions/{id}/validate: Build a validation package and discard it.
#[utoipa::path(
    get,
    path = "/v1/versions/{id}/validate",
    params(("id" = Uuid, Path, description = "Publication version ID")),
    responses(
        (status = 200, description = "Version is publishable", body = ValidateResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Act no longer usable", body = crate::error::ErrorBody),
        (status = 441, description = "Publication input invalid", body = crate::error::ErrorBody),
        (status = 444, description = "Validation rules failed", body = crate::error::ErrorBody),
    ),
    tag = "packages"
)]
async fn validate_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ValidateResponse>, AppError> {
    validate_act_package(&state, id)?;
    Ok(Json(ValidateResponse {
        message: "OK".to_string(),
    }))
}

/// GET /v1/packages: Act and announcement packages, newest first.
#[utoipa::path(
    get,
    path = "/v1/packages",
    params(
        ("limit" = Option<usize>, Query, description = "Max items to return (default 100, max 1000)"),
        ("offset" = Option<usize>, Query, description = "Items to skip (default 0)"),
        PackageFilter,
    ),
    responses(
        (status = 200, description = "Packages", body = PackagePage),
    ),
    tag = "packages"
)]
async fn list_packages(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<PackageFilter>,
) -> Json<PackagePage> {
    let all = unified_packages(&state, &filter);
    let total = all.len();
    Json(PackagePage {
        total,
        offset: pagination.effective_offset(),
        limit: pagination.effective_limit(),
        results: pagination.page(all),
    })
}

/// GET /v1/versions/{id}/act-packages: Packages of a version, newest first.
#[utoipa::path(
    get,
    path = "/v1/versions/{id}/act-packages",
    params(("id" = Uuid, Path, description = "Publication version ID")),
    responses(
        (status = 200, description = "Act packages", body = Vec<ActPackageRecord>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "packages"
)]
async fn list_act_packages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ActPackageRecord>>, AppError> {
    if !state.versions.contains(&id) {
        return Err(AppError::NotFound(format!("publication version {id} not found")));
    }
    let mut packages = state.act_packages.filter(|p| p.version_id == id);
    packages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(packages))
}

/// GET /v1/act-packages/{id}: Package detail with its reports.
#[utoipa::path(
    get,
    path = "/v1/act-packages/{id}",
    params(("id" = Uuid, Path, description = "Act package ID")),
    responses(
        (status = 200, description = "Act package", body = ActPackageRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "packages"
)]
async fn get_act_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActPackageRecord>, AppError> {
    state
        .act_packages
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("act package {id} not found")))
}

/// POST /v1/act-packages/{id}/report: Upload LVBB reports.
#[utoipa::path(
    post,
    path = "/v1/act-packages/{id}/report",
    params(("id" = Uuid, Path, description = "Act package ID")),
    request_body = UploadReportsRequest,
    responses(
        (status = 200, description = "Reports processed", body = ReportUploadResponse),
        (status = 400, description = "No files, unparsable report or delivery mismatch", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "packages"
)]
async fn upload_reports(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UploadReportsRequest>, JsonRejection>,
) -> Result<Json<ReportUploadResponse>, AppError> {
    let req = extract_json(body)?;
    let (response, changes) = upload_act_reports(&state, id, &req.files)?;
    persist_changes(&state, &changes).await?;
    Ok(Json(response))
}

/// POST /v1/act-packages/{id}/abort: Roll back a valid publication.
#[utoipa::path(
    post,
    path = "/v1/act-packages/{id}/abort",
    params(
        ("id" = Uuid, Path, description = "Act package ID"),
        AbortParams,
    ),
    responses(
        (status = 200, description = "Package aborted", body = AbortResponse),
        (status = 406, description = "Report not valid", body = crate::error::ErrorBody),
        (status = 450, description = "Abort not confirmed", body = crate::error::ErrorBody),
        (status = 451, description = "Not a publication package", body = crate::error::ErrorBody),
        (status = 452, description = "Too old or not the latest package", body = crate::error::ErrorBody),
    ),
    tag = "packages"
)]
async fn abort_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<AbortParams>,
) -> Result<Json<AbortResponse>, AppError> {
    let (response, changes) = abort_act_package(&state, id, params.confirm)?;
    persist_changes(&state, &changes).await?;
    tracing::info!(package = %id, restored = %response.new_state_uuid, "act package aborted");
    Ok(Json(response))
}
