//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware through the `metrics` facade. Domain gauges (environments,
//! locks, pending packages) are set on each `/metrics` scrape, see
//! [`record_domain_gauges`].
//!
//! The binary installs the Prometheus recorder once; without a recorder
//! every macro call is a no-op, which is what the tests rely on.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use ob_state::ReportStatus;

use crate::state::AppState;

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("ob_http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| format!("invalid histogram buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("failed to install Prometheus recorder: {e}"))
}

/// Middleware that records request count, latency and errors.
///
/// The `path` label is the matched route template (`/v1/act-packages/{id}`),
/// never the raw URI, to keep label cardinality bounded.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status();
    let status_label = status.as_u16().to_string();
    metrics::counter!(
        "ob_http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status_label.clone()
    )
    .increment(1);
    metrics::histogram!(
        "ob_http_request_duration_seconds",
        "method" => method.clone(),
        "path" => path.clone()
    )
    .record(start.elapsed().as_secs_f64());
    if status.is_client_error() || status.is_server_error() {
        metrics::counter!(
            "ob_http_errors_total",
            "method" => method,
            "path" => path,
            "status" => status_label
        )
        .increment(1);
    }

    response
}

/// Update domain gauges from current `AppState` (pull model).
pub fn record_domain_gauges(state: &AppState) {
    let environments = state.environments.list();
    metrics::gauge!("ob_environments_total").set(environments.len() as f64);
    metrics::gauge!("ob_environments_locked").set(
        environments.iter().filter(|e| e.is_locked).count() as f64,
    );
    metrics::gauge!("ob_environment_states_total").set(state.states.len() as f64);

    for status in [
        ReportStatus::Pending,
        ReportStatus::Valid,
        ReportStatus::Failed,
        ReportStatus::Aborted,
        ReportStatus::NotApplicable,
    ] {
        let count = state
            .act_packages
            .filter(|p| p.report_status == status)
            .len();
        metrics::gauge!("ob_act_packages_total", "report_status" => status.as_str())
            .set(count as f64);
    }

    metrics::gauge!("ob_modules_total").set(state.modules.len() as f64);
    metrics::gauge!("ob_objects_total").set(state.objects.len() as f64);
}
