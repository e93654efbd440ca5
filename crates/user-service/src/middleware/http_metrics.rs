//! HTTP metrics middleware.
//!
//! Records one counter increment and one latency observation per request,
//! labeled by normalized method, matched route template and status class.
//! Recording also happens for framework-generated responses (404 fallback,
//! 405, JSON rejections) and for handlers that panic; a panic is counted as
//! 5xx and then resumed so the outer panic layer can answer.
//!
//! `/health` and `/metrics` are never recorded.

use crate::observability::metrics::HttpMetrics;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Paths that bypass recording. Exact match only: `/health/` is not
/// excluded and lands on the fallback as route `unknown`.
pub const EXCLUDED_PATHS: [&str; 2] = ["/health", "/metrics"];

/// Status recorded when the downstream chain panics.
const PANIC_STATUS: u16 = 500;

/// Middleware that records HTTP request metrics.
///
/// The response (or panic) from the inner service is passed through
/// unchanged.
pub async fn http_metrics_middleware(
    State(metrics): State<HttpMetrics>,
    request: Request,
    next: Next,
) -> Response {
    if EXCLUDED_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().as_str().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string());

    let outcome = AssertUnwindSafe(next.run(request)).catch_unwind().await;

    let status_code = match &outcome {
        Ok(response) => response.status().as_u16(),
        Err(_) => PANIC_STATUS,
    };
    metrics.record(&method, route.as_deref(), status_code, start.elapsed());

    match outcome {
        Ok(response) => response,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
