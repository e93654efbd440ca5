//! HTTP routes for the User Service.
//!
//! Defines the Axum router and application state.

use crate::config::{Config, CorsOrigins};
use crate::errors::panic_response;
use crate::handlers::{self, users};
use crate::middleware::http_metrics_middleware;
use crate::observability::metrics::{HttpMetrics, MetricRegistry};
use crate::repositories::UserStore;
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Overall per-request timeout; store calls have their own, shorter deadlines.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User store (PostgreSQL in production, in-memory in tests).
    pub store: Arc<dyn UserStore>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness check (store ping) - not instrumented
/// - `/metrics` - Prometheus exposition - not instrumented
/// - `/api/users` - list, create
/// - `/api/users/:id` - get, update, delete
/// - fallback returning 404
///
/// Layer order (innermost first):
/// 1. TimeoutLayer - bound the whole request
/// 2. CorsLayer - answers preflights, so they are still recorded below
/// 3. http_metrics_middleware - record every response, including 404/405/400
///    produced by the framework and panics
/// 4. CatchPanicLayer - turn a resumed panic into a 500 error body
/// 5. TraceLayer - request span carrying the request id
/// 6. Request id propagation and generation (UUID v4, outermost)
pub fn build_routes(
    state: Arc<AppState>,
    registry: Arc<MetricRegistry>,
    http_metrics: HttpMetrics,
) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(registry);

    api_routes
        .merge(metrics_routes)
        .fallback(users::route_not_found)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            http_metrics,
            http_metrics_middleware,
        ))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "us.http.request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(target: "us.config", origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}
