//! Test server harness for E2E testing
//!
//! Provides `TestUserServer` for spawning real User Service instances in tests.

use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use user_service::config::Config;
use user_service::observability::metrics::{HttpMetrics, MetricRegistry};
use user_service::observability::testing::MetricSnapshot;
use user_service::repositories::{InMemoryUserStore, PgUserStore, UserStore};
use user_service::routes::{self, AppState};

/// Test harness for spawning the User Service in E2E tests.
///
/// Each instance owns its own [`MetricRegistry`], so metric assertions in
/// one test are never affected by another.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<()> {
///     let store = Arc::new(InMemoryUserStore::new());
///     let server = TestUserServer::spawn(store.clone()).await?;
///
///     store.set_available(false);
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 503);
///     Ok(())
/// }
/// ```
pub struct TestUserServer {
    addr: SocketAddr,
    registry: Arc<MetricRegistry>,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestUserServer {
    /// Spawn a server backed by `store` with default configuration.
    pub async fn spawn(store: Arc<dyn UserStore>) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(store, &[]).await
    }

    /// Spawn a server backed by a fresh in-memory store.
    pub async fn spawn_in_memory() -> Result<Self, anyhow::Error> {
        Self::spawn(Arc::new(InMemoryUserStore::new())).await
    }

    /// Spawn a server backed by PostgreSQL (typically a `#[sqlx::test]` pool).
    pub async fn spawn_with_pool(pool: PgPool) -> Result<Self, anyhow::Error> {
        Self::spawn(Arc::new(PgUserStore::new(pool))).await
    }

    /// Spawn a server with extra configuration variables.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    ///
    /// # Arguments
    /// * `store` - Store the handlers use
    /// * `overrides` - Environment-style variables, e.g. `("STORE_TIMEOUT_MS", "50")`
    pub async fn spawn_with_vars(
        store: Arc<dyn UserStore>,
        overrides: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ]);
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let registry = Arc::new(
            MetricRegistry::new()
                .map_err(|e| anyhow::anyhow!("Failed to create metric registry: {}", e))?,
        );
        let http_metrics = HttpMetrics::register(&registry)
            .map_err(|e| anyhow::anyhow!("Failed to register HTTP metrics: {}", e))?;

        let state = Arc::new(AppState {
            store,
            config: config.clone(),
        });

        // Build routes using user-service's real route builder
        let app = routes::build_routes(state, Arc::clone(&registry), http_metrics);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            registry,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current metrics, read straight from the server's registry.
    pub fn metrics(&self) -> MetricSnapshot {
        MetricSnapshot::new(self.registry.render())
    }
}

impl Drop for TestUserServer {
    fn drop(&mut self) {
        // Abort the HTTP server task so the port is released when the test ends.
        self._handle.abort();
    }
}
