//! # Module API
//!
//! A module is a draft change set of policy objects. It moves from
//! `Niet-Actief` through the public approval statuses to either
//! `Module afgerond` (objects become durable) or `Gesloten`.
//!
//! Status patches need the module to be temporarily locked, and
//! completion needs the lock plus a `Vastgesteld` status.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use ob_state::{object_validity, Module, ModuleObjectAction, ModuleStatusCode};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, require_text, Validate};
use crate::routes::objects::allocate_code;
use crate::routes::PaginationParams;
use crate::state::{AppState, ModuleObjectRecord, ObjectContent, ObjectRecord};

// -- Request / Response Types -------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateModuleRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for CreateModuleRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title, 255)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PatchStatusRequest {
    /// One of the public statuses, e.g. `"Ontwerp GS"` or `"Vastgesteld"`.
    pub status: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompleteModuleRequest {
    /// Start validity of the completed objects; defaults to now.
    pub start_validity: Option<DateTime<Utc>>,
}

/// Add an object to a module. Without a `code` a new object is created.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddModuleObjectRequest {
    pub object_type: String,
    pub code: Option<String>,
    /// `Edit` or `Terminate` for existing objects; ignored for new ones.
    #[schema(value_type = Option<String>)]
    pub action: Option<ModuleObjectAction>,
    #[serde(flatten)]
    pub content: ObjectContent,
}

impl Validate for AddModuleObjectRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("object_type", &self.object_type, 64)?;
        require_text("title", &self.content.title, 255)?;
        if self.code.is_none() && matches!(self.action, Some(ModuleObjectAction::Terminate)) {
            return Err("a new object can not be terminated".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModuleStatusEntry {
    pub status: String,
    pub created_date: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModuleResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub activated: bool,
    pub closed: bool,
    pub successful: bool,
    pub temporary_locked: bool,
    pub status: String,
    pub status_history: Vec<ModuleStatusEntry>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<&Module> for ModuleResponse {
    fn from(m: &Module) -> Self {
        Self {
            id: m.id.0,
            title: m.title.clone(),
            description: m.description.clone(),
            activated: m.activated,
            closed: m.closed,
            successful: m.successful,
            temporary_locked: m.temporary_locked,
            status: m.status().to_string(),
            status_history: m
                .status_history
                .iter()
                .map(|s| ModuleStatusEntry {
                    status: s.status.to_string(),
                    created_date: s.created_date,
                    created_by: s.created_by,
                })
                .collect(),
            created_at: m.created_at,
            modified_at: m.modified_at,
        }
    }
}

/// Result of completing a module.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompleteModuleResponse {
    pub module: ModuleResponse,
    pub start_validity: DateTime<Utc>,
    pub objects: Vec<ObjectRecord>,
}

// -- Router -------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/modules", get(list_modules).post(create_module))
        .route("/v1/modules/{id}", get(get_module))
        .route("/v1/modules/{id}/activate", post(activate_module))
        .route("/v1/modules/{id}/lock", post(lock_module))
        .route("/v1/modules/{id}/unlock", post(unlock_module))
        .route("/v1/modules/{id}/status", patch(patch_module_status))
        .route("/v1/modules/{id}/complete", post(complete_module))
        .route("/v1/modules/{id}/close", post(close_module))
        .route(
            "/v1/modules/{id}/objects",
            get(list_module_objects).post(add_module_object),
        )
        .route(
            "/v1/modules/{id}/objects/{object_id}",
            put(update_module_object),
        )
}

// -- Helpers ------------------------------------------------------------------

/// Run a lifecycle transition under the module's write lock.
fn transition(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut Module) -> Result<(), ob_state::ModuleError>,
) -> Result<Module, AppError> {
    state
        .modules
        .try_update(&id, |module| {
            f(module)?;
            Ok::<_, AppError>(module.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("module {id} not found")))?
}

fn editable_module(state: &AppState, id: Uuid) -> Result<Module, AppError> {
    let module = state
        .modules
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("module {id} not found")))?;
    module.ensure_editable()?;
    Ok(module)
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/modules: Create a module.
#[utoipa::path(
    post,
    path = "/v1/modules",
    request_body = CreateModuleRequest,
    responses(
        (status = 201, description = "Module created", body = ModuleResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn create_module(
    State(state): State<AppState>,
    body: Result<Json<CreateModuleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ModuleResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let module = Module::new(req.title, req.description);
    state.modules.insert(module.id.0, module.clone());
    tracing::info!(module = %module.id, "module created");
    Ok((StatusCode::CREATED, Json(ModuleResponse::from(&module))))
}

/// GET /v1/modules: List modules, newest first.
#[utoipa::path(
    get,
    path = "/v1/modules",
    params(
        ("limit" = Option<usize>, Query, description = "Max items to return (default 100, max 1000)"),
        ("offset" = Option<usize>, Query, description = "Items to skip (default 0)"),
    ),
    responses(
        (status = 200, description = "List of modules", body = Vec<ModuleResponse>),
    ),
    tag = "modules"
)]
async fn list_modules(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Json<Vec<ModuleResponse>> {
    let mut all = state.modules.list();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(pagination.page(all).iter().map(ModuleResponse::from).collect())
}

/// GET /v1/modules/{id}: Get a module.
#[utoipa::path(
    get,
    path = "/v1/modules/{id}",
    params(("id" = Uuid, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module found", body = ModuleResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn get_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModuleResponse>, AppError> {
    state
        .modules
        .get(&id)
        .map(|m| Json(ModuleResponse::from(&m)))
        .ok_or_else(|| AppError::NotFound(format!("module {id} not found")))
}

/// POST /v1/modules/{id}/activate: Activate a module.
#[utoipa::path(
    post,
    path = "/v1/modules/{id}/activate",
    params(("id" = Uuid, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module activated", body = ModuleResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already active or closed", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn activate_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModuleResponse>, AppError> {
    let module = transition(&state, id, |m| m.activate(None))?;
    tracing::info!(module = %id, "module activated");
    Ok(Json(ModuleResponse::from(&module)))
}

/// POST /v1/modules/{id}/lock: Temporarily lock a module.
#[utoipa::path(
    post,
    path = "/v1/modules/{id}/lock",
    params(("id" = Uuid, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module locked", body = ModuleResponse),
        (status = 409, description = "Module closed", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn lock_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModuleResponse>, AppError> {
    let module = transition(&state, id, Module::lock)?;
    Ok(Json(ModuleResponse::from(&module)))
}

/// POST /v1/modules/{id}/unlock: Release the temporary lock.
#[utoipa::path(
    post,
    path = "/v1/modules/{id}/unlock",
    params(("id" = Uuid, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module unlocked", body = ModuleResponse),
        (status = 409, description = "Module closed", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn unlock_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModuleResponse>, AppError> {
    let module = transition(&state, id, Module::unlock)?;
    Ok(Json(ModuleResponse::from(&module)))
}

/// PATCH /v1/modules/{id}/status: Append a public status.
#[utoipa::path(
    patch,
    path = "/v1/modules/{id}/status",
    params(("id" = Uuid, Path, description = "Module ID")),
    request_body = PatchStatusRequest,
    responses(
        (status = 200, description = "Status appended", body = ModuleResponse),
        (status = 409, description = "Module not locked or not active", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown or internal status", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn patch_module_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<PatchStatusRequest>, JsonRejection>,
) -> Result<Json<ModuleResponse>, AppError> {
    let req = extract_json(body)?;
    let status = ModuleStatusCode::from_str(&req.status)?;
    let module = transition(&state, id, |m| m.patch_status(status, None))?;
    tracing::info!(module = %id, status = %status, "module status patched");
    Ok(Json(ModuleResponse::from(&module)))
}

/// POST /v1/modules/{id}/complete: Complete a module.
///
/// The module's object versions become durable objects valid from the
/// requested start; terminated objects end at that same moment.
#[utoipa::path(
    post,
    path = "/v1/modules/{id}/complete",
    params(("id" = Uuid, Path, description = "Module ID")),
    request_body = CompleteModuleRequest,
    responses(
        (status = 200, description = "Module completed", body = CompleteModuleResponse),
        (status = 409, description = "Module not locked or not Vastgesteld", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn complete_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CompleteModuleRequest>, JsonRejection>,
) -> Result<Json<CompleteModuleResponse>, AppError> {
    let req = extract_json(body)?;
    let (module, start) = state
        .modules
        .try_update(&id, |module| {
            let start = module.complete(req.start_validity, None)?;
            Ok::<_, AppError>((module.clone(), start))
        })
        .ok_or_else(|| AppError::NotFound(format!("module {id} not found")))??;

    let now = Utc::now();
    let objects: Vec<ObjectRecord> = state
        .module_objects
        .filter(|o| o.module_id == id)
        .into_iter()
        .map(|o| {
            let (start_validity, end_validity) = object_validity(o.action, start);
            ObjectRecord {
                uuid: Uuid::new_v4(),
                code: o.code,
                object_type: o.object_type,
                object_id: o.object_id,
                module_id: id,
                adjust_on: o.uuid,
                content: o.content,
                start_validity,
                end_validity,
                created_at: now,
            }
        })
        .collect();
    for object in &objects {
        state.objects.insert(object.uuid, object.clone());
    }

    tracing::info!(module = %id, objects = objects.len(), "module completed");
    Ok(Json(CompleteModuleResponse {
        module: ModuleResponse::from(&module),
        start_validity: start,
        objects,
    }))
}

/// POST /v1/modules/{id}/close: Close a module without completing it.
#[utoipa::path(
    post,
    path = "/v1/modules/{id}/close",
    params(("id" = Uuid, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module closed", body = ModuleResponse),
        (status = 409, description = "Already closed", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn close_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModuleResponse>, AppError> {
    let module = transition(&state, id, |m| m.close(None))?;
    tracing::info!(module = %id, "module closed");
    Ok(Json(ModuleResponse::from(&module)))
}

/// GET /v1/modules/{id}/objects: Object versions in a module.
#[utoipa::path(
    get,
    path = "/v1/modules/{id}/objects",
    params(("id" = Uuid, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module objects", body = Vec<ModuleObjectRecord>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn list_module_objects(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ModuleObjectRecord>>, AppError> {
    if !state.modules.contains(&id) {
        return Err(AppError::NotFound(format!("module {id} not found")));
    }
    let mut objects = state.module_objects.filter(|o| o.module_id == id);
    objects.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(Json(objects))
}

/// POST /v1/modules/{id}/objects: Add an object version to a module.
#[utoipa::path(
    post,
    path = "/v1/modules/{id}/objects",
    params(("id" = Uuid, Path, description = "Module ID")),
    request_body = AddModuleObjectRequest,
    responses(
        (status = 201, description = "Object added", body = ModuleObjectRecord),
        (status = 404, description = "Module or object code not found", body = crate::error::ErrorBody),
        (status = 409, description = "Module not editable or object already in module", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn add_module_object(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<AddModuleObjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ModuleObjectRecord>), AppError> {
    let req = extract_validated_json(body)?;
    editable_module(&state, id)?;

    let (registry, action) = match &req.code {
        None => (
            allocate_code(&state, &req.object_type)?,
            ModuleObjectAction::Create,
        ),
        Some(code) => {
            let registry = state
                .object_statics
                .filter(|s| &s.code == code)
                .into_iter()
                .next()
                .ok_or_else(|| AppError::NotFound(format!("object {code} not found")))?;
            if registry.object_type != req.object_type {
                return Err(AppError::Validation(format!(
                    "object {code} is of type {}",
                    registry.object_type
                )));
            }
            (registry, req.action.unwrap_or(ModuleObjectAction::Edit))
        }
    };

    let in_module = state
        .module_objects
        .filter(|o| o.module_id == id && o.code == registry.code);
    if !in_module.is_empty() {
        return Err(AppError::Conflict(format!(
            "object {} is already part of this module",
            registry.code
        )));
    }

    let record = ModuleObjectRecord {
        uuid: Uuid::new_v4(),
        module_id: id,
        code: registry.code,
        object_type: registry.object_type,
        object_id: registry.object_id,
        action,
        content: req.content,
        modified_at: Utc::now(),
    };
    state.module_objects.insert(record.uuid, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/modules/{id}/objects/{object_id}: Replace an object version's content.
#[utoipa::path(
    put,
    path = "/v1/modules/{id}/objects/{object_id}",
    params(
        ("id" = Uuid, Path, description = "Module ID"),
        ("object_id" = Uuid, Path, description = "Module object version ID"),
    ),
    request_body = ObjectContent,
    responses(
        (status = 200, description = "Object updated", body = ModuleObjectRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Module not editable", body = crate::error::ErrorBody),
    ),
    tag = "modules"
)]
async fn update_module_object(
    State(state): State<AppState>,
    Path((id, object_id)): Path<(Uuid, Uuid)>,
    body: Result<Json<ObjectContent>, JsonRejection>,
) -> Result<Json<ModuleObjectRecord>, AppError> {
    let content = extract_json(body)?;
    require_text("title", &content.title, 255).map_err(AppError::Validation)?;
    editable_module(&state, id)?;

    state
        .module_objects
        .try_update(&object_id, |record| {
            if record.module_id != id {
                return Err(AppError::NotFound(format!(
                    "object {object_id} not found in module {id}"
                )));
            }
            record.content = content;
            record.modified_at = Utc::now();
            Ok(record.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("object {object_id} not found")))?
        .map(Json)
}
