//! Repository layer for the User Service.
//!
//! Handlers and services only see the [`UserStore`] trait. Two
//! implementations ship with the crate:
//!
//! - [`PgUserStore`] - PostgreSQL via a shared sqlx `PgPool`
//! - [`InMemoryUserStore`] - a `BTreeMap` behind a bounded connection
//!   semaphore, used by tests and local runs
//!
//! Store calls are not deadline-bounded here; the service layer wraps each
//! call in its own deadline.

pub mod memory;
pub mod users;

pub use memory::InMemoryUserStore;
pub use users::PgUserStore;

use crate::models::User;
use thiserror::Error;

/// Repository-level failure.
///
/// Every variant is a store failure from the caller's point of view; the
/// service layer maps all of them to an internal error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Transactional, key-addressable user store.
///
/// `update_name` and `delete` return the number of affected rows so that
/// callers can tell "matched nothing" (`Ok(0)`) apart from "failed" (`Err`).
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Reachability check. Reads no data.
    async fn ping(&self) -> Result<(), StoreError>;

    /// All users ordered by id ascending.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Insert a user and return its stored id.
    async fn create(&self, id: &str, name: &str) -> Result<String, StoreError>;

    /// Fetch a user by id.
    async fn get(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Rename a user. Returns affected rows.
    async fn update_name(&self, id: &str, name: &str) -> Result<u64, StoreError>;

    /// Remove a user. Returns affected rows.
    async fn delete(&self, id: &str) -> Result<u64, StoreError>;
}
