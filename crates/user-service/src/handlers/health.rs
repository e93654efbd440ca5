//! Liveness check.
//!
//! `GET /health` pings the store under the health deadline. The check never
//! fails the request itself: an unreachable or slow store is reported as
//! 503 with `{"status":"unhealthy"}`, and the cause is logged server-side.

use crate::models::HealthResponse;
use crate::routes::AppState;
use crate::services::user_service;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

#[tracing::instrument(skip_all, name = "us.health.liveness")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match user_service::check_store(state.store.as_ref(), state.config.health_timeout).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "us.health", error = %e, "Liveness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                }),
            )
        }
    }
}
