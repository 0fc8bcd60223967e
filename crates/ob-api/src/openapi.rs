//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Omgevingsbeleid Publication API",
        version = "0.1.0",
        description = "Modules, policy objects and their publication to the LVBB.\n\nProvides:\n- **Module lifecycle**: activation, locking, status history, completion into durable objects\n- **Publication environments** with a chained, versioned state per environment\n- **Act packages** built against the active state, LVBB report upload and abort\n- **Announcement packages** for published drafts\n\nHealth probes (`/health/*`) and `/metrics` are served outside `/v1`.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // ── Modules ──────────────────────────────────────────────────────
        crate::routes::modules::create_module,
        crate::routes::modules::list_modules,
        crate::routes::modules::get_module,
        crate::routes::modules::activate_module,
        crate::routes::modules::lock_module,
        crate::routes::modules::unlock_module,
        crate::routes::modules::patch_module_status,
        crate::routes::modules::complete_module,
        crate::routes::modules::close_module,
        crate::routes::modules::list_module_objects,
        crate::routes::modules::add_module_object,
        crate::routes::modules::update_module_object,
        // ── Objects ──────────────────────────────────────────────────────
        crate::routes::objects::create_object_static,
        crate::routes::objects::list_object_statics,
        crate::routes::objects::list_valid_objects,
        crate::routes::objects::get_object_versions,
        // ── Environments ─────────────────────────────────────────────────
        crate::routes::environments::create_environment,
        crate::routes::environments::list_environments,
        crate::routes::environments::get_environment,
        crate::routes::environments::list_states,
        crate::routes::environments::get_active_state,
        // ── Acts & publications ──────────────────────────────────────────
        crate::routes::publications::create_act,
        crate::routes::publications::list_acts,
        crate::routes::publications::get_act,
        crate::routes::publications::deactivate_act,
        crate::routes::publications::create_publication,
        crate::routes::publications::list_publications,
        crate::routes::publications::create_version,
        crate::routes::publications::list_versions,
        crate::routes::publications::get_version,
        // ── Act packages ─────────────────────────────────────────────────
        crate::routes::packages::list_packages,
        crate::routes::packages::validate_version,
        crate::routes::packages::create_package,
        crate::routes::packages::list_act_packages,
        crate::routes::packages::get_act_package,
        crate::routes::packages::upload_reports,
        crate::routes::packages::abort_package,
        // ── Announcements ────────────────────────────────────────────────
        crate::routes::announcements::create_announcement_handler,
        crate::routes::announcements::get_announcement,
        crate::routes::announcements::create_package,
        crate::routes::announcements::list_packages,
        crate::routes::announcements::upload_reports,
        // ── Registry ─────────────────────────────────────────────────────
        crate::routes::registry::create_asset,
        crate::routes::registry::get_asset,
        crate::routes::registry::create_area_of_jurisdiction,
        crate::routes::registry::list_areas_of_jurisdiction,
    ),
    components(
        schemas(
            // ── Records ─────────────────────────────────────────────────
            crate::state::ObjectContent,
            crate::state::ObjectStaticRecord,
            crate::state::ModuleObjectRecord,
            crate::state::ObjectRecord,
            crate::state::AssetRecord,
            crate::state::AreaOfJurisdictionRecord,
            crate::state::EnvironmentStateRecord,
            crate::state::ActVersionRecord,
            crate::state::ActRecord,
            crate::state::PublicationRecord,
            crate::state::PublicationVersionRecord,
            crate::state::PackageZipRecord,
            crate::state::ReportRecord,
            crate::state::PackageWerkingsgebied,
            crate::state::ActPackageRecord,
            crate::state::AnnouncementRecord,
            crate::state::AnnouncementPackageRecord,
            // ── Error types ─────────────────────────────────────────────
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            // ── Module DTOs ─────────────────────────────────────────────
            crate::routes::PaginationParams,
            crate::routes::modules::CreateModuleRequest,
            crate::routes::modules::PatchStatusRequest,
            crate::routes::modules::CompleteModuleRequest,
            crate::routes::modules::AddModuleObjectRequest,
            crate::routes::modules::ModuleStatusEntry,
            crate::routes::modules::ModuleResponse,
            crate::routes::modules::CompleteModuleResponse,
            // ── Object DTOs ─────────────────────────────────────────────
            crate::routes::objects::CreateObjectStaticRequest,
            // ── Environment DTOs ────────────────────────────────────────
            crate::routes::environments::CreateEnvironmentRequest,
            crate::routes::environments::EnvironmentResponse,
            // ── Publication DTOs ────────────────────────────────────────
            crate::routes::publications::CreateActRequest,
            crate::routes::publications::CreatePublicationRequest,
            crate::routes::publications::CreateVersionRequest,
            // ── Package DTOs ────────────────────────────────────────────
            crate::routes::packages::CreatePackageRequest,
            crate::routes::packages::UploadReportsRequest,
            crate::packaging::UploadedReport,
            crate::packaging::PackageCreatedResponse,
            crate::packaging::ReportUploadResponse,
            crate::packaging::AbortResponse,
            crate::packaging::PublicationKind,
            crate::packaging::UnifiedPackage,
            crate::routes::packages::ValidateResponse,
            crate::routes::packages::PackagePage,
            // ── Registry DTOs ───────────────────────────────────────────
            crate::routes::registry::CreateAssetRequest,
            crate::routes::registry::CreateAreaOfJurisdictionRequest,
        ),
    ),
    tags(
        (name = "modules", description = "Module lifecycle and the object versions a module carries"),
        (name = "objects", description = "Object code registry and currently valid objects"),
        (name = "environments", description = "Publication environments and their state chain"),
        (name = "publications", description = "Acts, publications and publication versions"),
        (name = "packages", description = "Act packages, LVBB report upload and abort"),
        (name = "announcements", description = "Announcements (kennisgevingen) and their packages"),
        (name = "registry", description = "Assets and areas of jurisdiction"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates_successfully() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Omgevingsbeleid Publication API");
        assert_eq!(spec.info.version, "0.1.0");
    }

    #[test]
    fn test_openapi_spec_has_module_paths() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/v1/modules"));
        assert!(spec.paths.paths.contains_key("/v1/modules/{id}/complete"));
        assert!(spec.paths.paths.contains_key("/v1/modules/{id}/objects"));
    }

    #[test]
    fn test_openapi_spec_has_package_paths() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/v1/versions/{id}/act-packages"));
        assert!(spec.paths.paths.contains_key("/v1/act-packages/{id}/report"));
        assert!(spec.paths.paths.contains_key("/v1/act-packages/{id}/abort"));
        assert!(spec.paths.paths.contains_key("/v1/versions/{id}/validate"));
        assert!(spec.paths.paths.contains_key("/v1/packages"));
        assert!(spec
            .paths
            .paths
            .contains_key("/v1/announcement-packages/{id}/report"));
    }

    #[test]
    fn test_openapi_spec_has_environment_paths() {
        let spec = ApiDoc::openapi();
        assert!(spec
            .paths
            .paths
            .contains_key("/v1/environments/{id}/active-state"));
    }

    #[test]
    fn test_openapi_spec_has_schemas() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components");
        for name in ["ActPackageRecord", "ErrorBody", "ModuleResponse"] {
            assert!(
                components.schemas.contains_key(name),
                "missing schema {name}"
            );
        }
    }
}
