//! # ob-api: Axum API Services for the Publication Stack
//!
//! HTTP surface over the module lifecycle, the policy object registry and
//! the publication of acts and announcements to the LVBB.
//!
//! ## API Surface
//!
//! | Prefix                          | Module                      | Domain                  |
//! |---------------------------------|-----------------------------|-------------------------|
//! | `/v1/modules/*`                 | [`routes::modules`]         | Module lifecycle        |
//! | `/v1/objects/*`                 | [`routes::objects`]         | Object registry         |
//! | `/v1/environments/*`            | [`routes::environments`]    | Environments and states |
//! | `/v1/acts/*`, `/v1/publications/*`, `/v1/versions/*` | [`routes::publications`] | Acts and publications |
//! | `/v1/versions/*/act-packages`, `/v1/act-packages/*` | [`routes::packages`] | Act packages |
//! | `/v1/announcements/*`, `/v1/announcement-packages/*` | [`routes::announcements`] | Announcements |
//! | `/v1/assets/*`, `/v1/areas-of-jurisdiction` | [`routes::registry`] | Assets, areas of jurisdiction |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated OpenAPI 3.1 spec via utoipa derive macros at `/openapi.json`.

pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod packaging;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Check if metrics are enabled via the `OB_METRICS_ENABLED` env var.
/// Defaults to `true` when the variable is absent or set to anything other than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("OB_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and `/metrics` are mounted outside the API
/// middleware so probe traffic does not show up in request metrics.
pub fn app(state: AppState) -> Router {
    let metrics_on = metrics_enabled();

    // Body size limit: 16 MiB. Report uploads and object text with inline
    // assets are larger than typical JSON requests.
    let mut api = Router::new()
        .merge(routes::modules::router())
        .merge(routes::objects::router())
        .merge(routes::environments::router())
        .merge(routes::publications::router())
        .merge(routes::packages::router())
        .merge(routes::announcements::router())
        .merge(routes::registry::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024));

    if metrics_on {
        api = api.layer(from_fn(middleware::metrics::metrics_middleware));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let mut probes = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if metrics_on {
        probes = probes.route("/metrics", axum::routing::get(prometheus_metrics));
    }

    let probes = probes.with_state(state);

    Router::new().merge(probes).merge(api)
}

/// GET /metrics: Prometheus scrape endpoint.
///
/// Updates domain gauges from current `AppState` on each scrape (pull model),
/// then renders everything the installed recorder holds.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    middleware::metrics::record_domain_gauges(&state);

    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
///
/// Checks that the in-memory stores are readable and, when configured,
/// that the database answers. Returns 200 "ready" or 503 with a
/// diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.environments.len();
    let _ = state.states.len();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
