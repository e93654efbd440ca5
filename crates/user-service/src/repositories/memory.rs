//! In-memory user store.
//!
//! Behaves like the PostgreSQL store from the caller's point of view:
//! ids are unique, `created_at` is set on insert, listing is ordered by id,
//! and mutations report affected rows. A semaphore stands in for the
//! connection pool, so a call holds one "connection" for its whole duration
//! (including any injected latency) and gives it back when its future
//! completes or is dropped.
//!
//! # Fault injection
//!
//! - [`InMemoryUserStore::set_latency`] delays every call while it holds a
//!   connection, which lets tests drive calls past their deadline.
//! - [`InMemoryUserStore::set_available`] makes calls fail after checkout.
//! - [`InMemoryUserStore::close`] closes the pool for good.

use super::{StoreError, UserStore};
use crate::models::User;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Default number of concurrent "connections".
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// `BTreeMap`-backed store with a bounded connection semaphore.
#[derive(Debug)]
pub struct InMemoryUserStore {
    users: Mutex<BTreeMap<String, User>>,
    connections: Semaphore,
    max_connections: usize,
    latency_micros: AtomicU64,
    available: AtomicBool,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    /// Create an empty store with [`DEFAULT_MAX_CONNECTIONS`] connections.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_connections(DEFAULT_MAX_CONNECTIONS)
    }

    #[must_use]
    pub fn with_max_connections(max_connections: usize) -> Self {
        Self {
            users: Mutex::new(BTreeMap::new()),
            connections: Semaphore::new(max_connections),
            max_connections,
            latency_micros: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Delay every subsequent call by `latency` while it holds a connection.
    pub fn set_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros.store(micros, Ordering::SeqCst);
    }

    /// Toggle whether calls succeed after checking out a connection.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Close the connection pool. Every later call fails.
    pub fn close(&self) {
        self.connections.close();
    }

    /// Connections not currently checked out.
    pub fn available_connections(&self) -> usize {
        self.connections.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    fn latency(&self) -> Duration {
        Duration::from_micros(self.latency_micros.load(Ordering::SeqCst))
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check out a connection, wait out any injected latency, then fail if
    /// the store is marked unavailable. The permit goes back on drop.
    async fn checkout(&self) -> Result<SemaphorePermit<'_>, StoreError> {
        let permit = self
            .connections
            .acquire()
            .await
            .map_err(|_| StoreError::Unavailable("connection pool is closed".to_string()))?;

        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }

        Ok(permit)
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let _conn = self.checkout().await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let _conn = self.checkout().await?;
        Ok(self.lock().values().cloned().collect())
    }

    async fn create(&self, id: &str, name: &str) -> Result<String, StoreError> {
        let _conn = self.checkout().await?;

        if name.is_empty() {
            return Err(StoreError::Constraint("name must not be empty".to_string()));
        }

        let mut users = self.lock();
        if users.contains_key(id) {
            return Err(StoreError::Constraint(format!(
                "user id already exists: {}",
                id
            )));
        }

        users.insert(
            id.to_string(),
            User {
                id: id.to_string(),
                name: name.to_string(),
                created_at: Utc::now(),
            },
        );

        Ok(id.to_string())
    }

    async fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        let _conn = self.checkout().await?;
        Ok(self.lock().get(id).cloned())
    }

    async fn update_name(&self, id: &str, name: &str) -> Result<u64, StoreError> {
        let _conn = self.checkout().await?;

        if name.is_empty() {
            return Err(StoreError::Constraint("name must not be empty".to_string()));
        }

        match self.lock().get_mut(id) {
            Some(user) => {
                user.name = name.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        let _conn = self.checkout().await?;
        Ok(u64::from(self.lock().remove(id).is_some()))
    }
}
