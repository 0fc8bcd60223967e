//! # Registry API
//!
//! Assets (images referenced from object text) and areas of jurisdiction
//! (the administrative borders every act package refers to).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use ob_core::sha256_hex;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_text, Validate};
use crate::state::{AppState, AreaOfJurisdictionRecord, AssetRecord};

const ASSET_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAssetRequest {
    pub extension: String,
    /// Encoded image content as stored, e.g. a base64 data URI.
    pub content: String,
}

impl Validate for CreateAssetRequest {
    fn validate(&self) -> Result<(), String> {
        if !ASSET_EXTENSIONS.contains(&self.extension.as_str()) {
            return Err(format!(
                "extension must be one of: {}",
                ASSET_EXTENSIONS.join(", ")
            ));
        }
        if self.content.is_empty() {
            return Err("content must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAreaOfJurisdictionRequest {
    pub title: String,
    pub administrative_borders_id: String,
    pub administrative_borders_domain: String,
    pub administrative_borders_date: NaiveDate,
}

impl Validate for CreateAreaOfJurisdictionRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title, 255)?;
        require_text("administrative_borders_id", &self.administrative_borders_id, 255)?;
        require_text(
            "administrative_borders_domain",
            &self.administrative_borders_domain,
            255,
        )
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/assets", post(create_asset))
        .route("/v1/assets/{id}", get(get_asset))
        .route(
            "/v1/areas-of-jurisdiction",
            get(list_areas_of_jurisdiction).post(create_area_of_jurisdiction),
        )
}

/// POST /v1/assets: Store an asset.
///
/// Identical content is stored once; the existing record is returned.
#[utoipa::path(
    post,
    path = "/v1/assets",
    request_body = CreateAssetRequest,
    responses(
        (status = 201, description = "Asset stored", body = AssetRecord),
        (status = 200, description = "Asset already stored", body = AssetRecord),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "registry"
)]
async fn create_asset(
    State(state): State<AppState>,
    body: Result<Json<CreateAssetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssetRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let checksum = sha256_hex(req.content.as_bytes());

    if let Some(existing) = state
        .assets
        .filter(|a| a.checksum == checksum)
        .into_iter()
        .next()
    {
        return Ok((StatusCode::OK, Json(existing)));
    }

    let record = AssetRecord {
        uuid: Uuid::new_v4(),
        extension: req.extension,
        checksum,
        size: req.content.len(),
        created_at: Utc::now(),
    };
    state.assets.insert(record.uuid, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/assets/{id}: Asset metadata.
#[utoipa::path(
    get,
    path = "/v1/assets/{id}",
    params(("id" = Uuid, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset found", body = AssetRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "registry"
)]
async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssetRecord>, AppError> {
    state
        .assets
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("asset {id} not found")))
}

/// POST /v1/areas-of-jurisdiction: Register administrative borders.
///
/// Packages use the most recently registered area.
#[utoipa::path(
    post,
    path = "/v1/areas-of-jurisdiction",
    request_body = CreateAreaOfJurisdictionRequest,
    responses(
        (status = 201, description = "Area registered", body = AreaOfJurisdictionRecord),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "registry"
)]
async fn create_area_of_jurisdiction(
    State(state): State<AppState>,
    body: Result<Json<CreateAreaOfJurisdictionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AreaOfJurisdictionRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let record = AreaOfJurisdictionRecord {
        uuid: Uuid::new_v4(),
        title: req.title,
        administrative_borders_id: req.administrative_borders_id,
        administrative_borders_domain: req.administrative_borders_domain,
        administrative_borders_date: req.administrative_borders_date,
        created_at: Utc::now(),
    };
    state
        .areas_of_jurisdiction
        .insert(record.uuid, record.clone());
    tracing::info!(area = %record.uuid, "area of jurisdiction registered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/areas-of-jurisdiction: Registered areas, newest first.
#[utoipa::path(
    get,
    path = "/v1/areas-of-jurisdiction",
    responses(
        (status = 200, description = "Areas of jurisdiction", body = Vec<AreaOfJurisdictionRecord>),
    ),
    tag = "registry"
)]
async fn list_areas_of_jurisdiction(
    State(state): State<AppState>,
) -> Json<Vec<AreaOfJurisdictionRecord>> {
    let mut all = state.areas_of_jurisdiction.list();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn asset_extension_must_be_an_image() {
        let req = CreateAssetRequest {
            extension: "exe".into(),
            content: "x".into(),
        };
        assert!(req.validate().unwrap_err().contains("png"));
    }

    #[tokio::test]
    async fn identical_asset_is_stored_once() {
        let state = AppState::new();
        let app = router().with_state(state.clone());
        let body = serde_json::json!({
            "extension": "png",
            "content": "data:image/png;base64,iVBORw0KGgo=",
        });

        let first = app.clone().oneshot(json_post("/v1/assets", body.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let second = app.oneshot(json_post("/v1/assets", body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(state.assets.len(), 1);
    }

    #[tokio::test]
    async fn latest_area_is_used_for_packages() {
        let state = AppState::new();
        let app = router().with_state(state.clone());
        for date in ["2023-01-01", "2024-06-01"] {
            let resp = app
                .clone()
                .oneshot(json_post(
                    "/v1/areas-of-jurisdiction",
                    serde_json::json!({
                        "title": "Zuid-Holland",
                        "administrative_borders_id": "PV28",
                        "administrative_borders_domain": "NL.BI.BestuurlijkGebied",
                        "administrative_borders_date": date,
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }
        let latest = state.latest_area_of_jurisdiction().unwrap();
        assert_eq!(
            latest.administrative_borders_date,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }
}
