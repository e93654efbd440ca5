//! User resource handlers.
//!
//! - `GET /api/users` - list users
//! - `POST /api/users` - create user
//! - `GET /api/users/:id` - get user
//! - `PUT /api/users/:id` - rename user
//! - `DELETE /api/users/:id` - delete user
//!
//! Handlers only extract and shape; validation, deadlines and error mapping
//! happen in [`crate::services::user_service`].

use crate::errors::UserServiceError;
use crate::models::{CreateUserRequest, CreateUserResponse, UpdateUserRequest, User};
use crate::routes::AppState;
use crate::services::user_service;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// A body that is not valid JSON for the expected shape is a client error.
fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, UserServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| UserServiceError::Validation(format!("invalid request body: {}", e.body_text())))
}

/// Handler for GET /api/users
#[instrument(skip_all, name = "us.users.list")]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, UserServiceError> {
    let users = user_service::list_users(state.store.as_ref(), state.config.store_timeout).await?;
    Ok(Json(users))
}

/// Handler for POST /api/users
///
/// Returns 201 with the stored id.
#[instrument(skip_all, name = "us.users.create")]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUserResponse>), UserServiceError> {
    let request = parse_body(payload)?;

    let id = user_service::create_user(
        state.store.as_ref(),
        state.config.store_timeout,
        &request.id,
        &request.name,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CreateUserResponse { id })))
}

/// Handler for GET /api/users/:id
#[instrument(skip_all, name = "us.users.get", fields(user_id = %id))]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, UserServiceError> {
    let user = user_service::get_user(state.store.as_ref(), state.config.store_timeout, &id).await?;
    Ok(Json(user))
}

/// Handler for PUT /api/users/:id
///
/// Returns 204 on success, 404 if no user has this id.
#[instrument(skip_all, name = "us.users.update", fields(user_id = %id))]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<StatusCode, UserServiceError> {
    let request = parse_body(payload)?;

    user_service::update_user(
        state.store.as_ref(),
        state.config.store_timeout,
        &id,
        &request.name,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /api/users/:id
///
/// Returns 204 on success, 404 if no user has this id.
#[instrument(skip_all, name = "us.users.delete", fields(user_id = %id))]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, UserServiceError> {
    user_service::delete_user(state.store.as_ref(), state.config.store_timeout, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback for requests that match no route.
pub async fn route_not_found() -> UserServiceError {
    UserServiceError::NotFound("route not found".to_string())
}
