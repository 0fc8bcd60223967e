//! # Announcement API
//!
//! A kennisgeving announces a published draft act. It hangs off a
//! successful publication package and is delivered in its own packages.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::packaging::{
    create_announcement, create_announcement_package, upload_announcement_reports,
    PackageCreatedResponse, ReportUploadResponse,
};
use crate::routes::packages::{CreatePackageRequest, UploadReportsRequest};
use crate::routes::persist_changes;
use crate::state::{AnnouncementPackageRecord, AnnouncementRecord, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/act-packages/{id}/announcements",
            post(create_announcement_handler),
        )
        .route("/v1/announcements/{id}", get(get_announcement))
        .route(
            "/v1/announcements/{id}/packages",
            post(create_package).get(list_packages),
        )
        .route(
            "/v1/announcement-packages/{id}/report",
            post(upload_reports),
        )
}

/// POST /v1/act-packages/{id}/announcements: Announce a publication.
#[utoipa::path(
    post,
    path = "/v1/act-packages/{id}/announcements",
    params(("id" = Uuid, Path, description = "Act package ID")),
    responses(
        (status = 201, description = "Announcement created", body = AnnouncementRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Package not a successful publication", body = crate::error::ErrorBody),
    ),
    tag = "announcements"
)]
async fn create_announcement_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<AnnouncementRecord>), AppError> {
    let announcement = create_announcement(&state, id)?;
    tracing::info!(announcement = %announcement.uuid, act_package = %id, "announcement created");
    Ok((StatusCode::CREATED, Json(announcement)))
}

/// GET /v1/announcements/{id}: Get an announcement.
#[utoipa::path(
    get,
    path = "/v1/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement", body = AnnouncementRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "announcements"
)]
async fn get_announcement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnnouncementRecord>, AppError> {
    state
        .announcements
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("announcement {id} not found")))
}

/// POST /v1/announcements/{id}/packages: Build an announcement package.
#[utoipa::path(
    post,
    path = "/v1/announcements/{id}/packages",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Package created", body = PackageCreatedResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Announcement or environment locked", body = crate::error::ErrorBody),
    ),
    tag = "announcements"
)]
async fn create_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CreatePackageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PackageCreatedResponse>), AppError> {
    let req = extract_json(body)?;
    let (package, changes) = create_announcement_package(&state, id, req.package_type)?;
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

/// GET /v1/announcements/{id}/packages: Packages of an announcement.
#[utoipa::path(
    get,
    path = "/v1/announcements/{id}/packages",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement packages", body = Vec<AnnouncementPackageRecord>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "announcements"
)]
async fn list_packages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AnnouncementPackageRecord>>, AppError> {
    if !state.announcements.contains(&id) {
        return Err(AppError::NotFound(format!("announcement {id} not found")));
    }
    let mut packages = state
        .announcement_packages
        .filter(|p| p.announcement_id == id);
    packages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(packages))
}

/// POST /v1/announcement-packages/{id}/report: Upload LVBB reports.
#[utoipa::path(
    post,
    path = "/v1/announcement-packages/{id}/report",
    params(("id" = Uuid, Path, description = "Announcement package ID")),
    request_body = UploadReportsRequest,
    responses(
        (status = 200, description = "Reports processed", body = ReportUploadResponse),
        (status = 400, description = "No files, unparsable report or delivery mismatch", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "announcements"
)]
async fn upload_reports(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UploadReportsRequest>, JsonRejection>,
) -> Result<Json<ReportUploadResponse>, AppError> {
    let req = extract_json(body)?;
    let (response, changes) = upload_announcement_reports(&state, id, &req.files)?;
    persist_changes(&state, &changes).await?;
    Ok(Json(response))
}
