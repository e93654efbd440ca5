//! User CRUD and store reachability.
//!
//! Each function validates its input, runs exactly one store call under the
//! given deadline, and maps the outcome:
//!
//! | Outcome | Error |
//! |---|---|
//! | empty id or name | `Validation` (400) |
//! | no row / zero rows affected | `NotFound` (404) |
//! | store error | `StoreUnavailable` (500) |
//! | deadline expired | `StoreTimeout` (500) |
//!
//! "Matched nothing" and "failed" are kept apart for update and delete: the
//! first is `Ok(0)` from the store and becomes `NotFound`, the second is an
//! `Err` and never does.

use crate::errors::UserServiceError;
use crate::models::User;
use crate::repositories::UserStore;
use crate::services::deadline::with_deadline;
use std::time::Duration;

fn require_non_empty(field: &str, value: &str) -> Result<(), UserServiceError> {
    if value.is_empty() {
        return Err(UserServiceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn user_not_found(id: &str) -> UserServiceError {
    UserServiceError::NotFound(format!("user {} not found", id))
}

/// All users ordered by id ascending.
pub async fn list_users(
    store: &dyn UserStore,
    deadline: Duration,
) -> Result<Vec<User>, UserServiceError> {
    with_deadline("list_users", deadline, store.list()).await
}

/// Create a user and return its stored id.
pub async fn create_user(
    store: &dyn UserStore,
    deadline: Duration,
    id: &str,
    name: &str,
) -> Result<String, UserServiceError> {
    require_non_empty("id", id)?;
    require_non_empty("name", name)?;

    let stored_id = with_deadline("create_user", deadline, store.create(id, name)).await?;

    tracing::info!(target: "us.service.users", user_id = %stored_id, "User created");

    Ok(stored_id)
}

pub async fn get_user(
    store: &dyn UserStore,
    deadline: Duration,
    id: &str,
) -> Result<User, UserServiceError> {
    require_non_empty("id", id)?;

    with_deadline("get_user", deadline, store.get(id))
        .await?
        .ok_or_else(|| user_not_found(id))
}

/// Rename a user. Zero affected rows is `NotFound`.
pub async fn update_user(
    store: &dyn UserStore,
    deadline: Duration,
    id: &str,
    name: &str,
) -> Result<(), UserServiceError> {
    require_non_empty("id", id)?;
    require_non_empty("name", name)?;

    let affected = with_deadline("update_user", deadline, store.update_name(id, name)).await?;
    if affected == 0 {
        return Err(user_not_found(id));
    }

    Ok(())
}

/// Remove a user. Zero affected rows is `NotFound`.
pub async fn delete_user(
    store: &dyn UserStore,
    deadline: Duration,
    id: &str,
) -> Result<(), UserServiceError> {
    require_non_empty("id", id)?;

    let affected = with_deadline("delete_user", deadline, store.delete(id)).await?;
    if affected == 0 {
        return Err(user_not_found(id));
    }

    tracing::info!(target: "us.service.users", user_id = %id, "User deleted");

    Ok(())
}

/// Reachability check for the health check. Reads no data.
pub async fn check_store(store: &dyn UserStore, deadline: Duration) -> Result<(), UserServiceError> {
    with_deadline("ping", deadline, store.ping()).await
}
