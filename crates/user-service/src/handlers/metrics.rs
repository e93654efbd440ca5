//! Prometheus metrics endpoint handler.
//!
//! Serves the text exposition of the process [`MetricRegistry`]. The
//! endpoint is unauthenticated; labels are bounded (known verbs, route
//! templates, status classes) and carry no user data.

use crate::observability::metrics::MetricRegistry;
use axum::{extract::State, http::header, response::IntoResponse};
use std::sync::Arc;

/// Prometheus text format content type.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Handler for GET /metrics
///
/// ```text
/// # HELP app_http_requests_total Total HTTP requests
/// # TYPE app_http_requests_total counter
/// app_http_requests_total{method="GET",route="/api/users",status_class="2xx"} 42
/// ```
#[tracing::instrument(skip_all, name = "us.metrics.scrape")]
pub async fn metrics_handler(State(registry): State<Arc<MetricRegistry>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        registry.render(),
    )
}
