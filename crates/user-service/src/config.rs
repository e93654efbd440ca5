//! User Service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default deadline for data operations against the store, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 3000;

/// Default deadline for the health check's store ping, in milliseconds.
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 1000;

/// Default maximum size of the database connection pool.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 5;

/// Which origins the CORS layer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// `*` - any origin.
    Any,
    /// An explicit allow-list.
    List(Vec<String>),
}

/// User Service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Deadline applied to every List/Create/Get/Update/Delete store call.
    pub store_timeout: Duration,

    /// Deadline applied to the health check's store ping.
    pub health_timeout: Duration,

    /// Maximum number of pooled database connections.
    pub db_max_connections: u32,

    /// Origins allowed by the CORS layer.
    pub cors_allowed_origins: CorsOrigins,

    /// Seconds to keep draining connections after a shutdown signal.
    pub drain_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("store_timeout", &self.store_timeout)
            .field("health_timeout", &self.health_timeout)
            .field("db_max_connections", &self.db_max_connections)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid timeout configuration: {0}")]
    InvalidTimeout(String),

    #[error("Invalid connection pool configuration: {0}")]
    InvalidPoolSize(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainPeriod(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let store_timeout = Duration::from_millis(parse_timeout_ms(
            vars,
            "STORE_TIMEOUT_MS",
            DEFAULT_STORE_TIMEOUT_MS,
        )?);

        let health_timeout = Duration::from_millis(parse_timeout_ms(
            vars,
            "HEALTH_TIMEOUT_MS",
            DEFAULT_HEALTH_TIMEOUT_MS,
        )?);

        let db_max_connections = if let Some(value_str) = vars.get("DB_MAX_CONNECTIONS") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidPoolSize(format!(
                    "DB_MAX_CONNECTIONS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidPoolSize(
                    "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_DB_MAX_CONNECTIONS
        };

        let cors_allowed_origins = match vars.get("CORS_ALLOWED_ORIGINS") {
            Some(value) => parse_cors_origins(value),
            None => CorsOrigins::Any,
        };

        let drain_seconds = if let Some(value_str) = vars.get("DRAIN_SECONDS") {
            value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainPeriod(format!(
                    "DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        Ok(Config {
            database_url,
            bind_address,
            store_timeout,
            health_timeout,
            db_max_connections,
            cors_allowed_origins,
            drain_seconds,
        })
    }
}

fn parse_timeout_ms(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| {
        ConfigError::InvalidTimeout(format!(
            "{} must be a valid positive integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value == 0 {
        return Err(ConfigError::InvalidTimeout(format!(
            "{} must be greater than 0",
            name
        )));
    }

    Ok(value)
}

fn parse_cors_origins(value: &str) -> CorsOrigins {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "DATABASE_URL".to_string(),
            "postgresql://localhost/users_test".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.database_url, "postgresql://localhost/users_test");
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.store_timeout, Duration::from_secs(3));
        assert_eq!(config.health_timeout, Duration::from_secs(1));
        assert_eq!(config.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
        assert_eq!(config.cors_allowed_origins, CorsOrigins::Any);
        assert_eq!(config.drain_seconds, DEFAULT_DRAIN_SECONDS);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("STORE_TIMEOUT_MS".to_string(), "2500".to_string());
        vars.insert("HEALTH_TIMEOUT_MS".to_string(), "250".to_string());
        vars.insert("DB_MAX_CONNECTIONS".to_string(), "4".to_string());
        vars.insert(
            "CORS_ALLOWED_ORIGINS".to_string(),
            "https://a.example.com, https://b.example.com".to_string(),
        );
        vars.insert("DRAIN_SECONDS".to_string(), "0".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.store_timeout, Duration::from_millis(2500));
        assert_eq!(config.health_timeout, Duration::from_millis(250));
        assert_eq!(config.db_max_connections, 4);
        assert_eq!(
            config.cors_allowed_origins,
            CorsOrigins::List(vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string(),
            ])
        );
        assert_eq!(config.drain_seconds, 0);
    }

    #[test]
    fn test_from_vars_missing_database_url() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn test_store_timeout_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("STORE_TIMEOUT_MS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTimeout(msg)) if msg.contains("STORE_TIMEOUT_MS must be greater than 0"))
        );
    }

    #[test]
    fn test_health_timeout_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert("HEALTH_TIMEOUT_MS".to_string(), "one-second".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTimeout(msg)) if msg.contains("must be a valid positive integer"))
        );
    }

    #[test]
    fn test_pool_size_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("DB_MAX_CONNECTIONS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidPoolSize(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_drain_seconds_rejects_negative() {
        let mut vars = base_vars();
        vars.insert("DRAIN_SECONDS".to_string(), "-1".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidDrainPeriod(_))));
    }

    #[test]
    fn test_cors_wildcard_anywhere_in_list_means_any() {
        assert_eq!(parse_cors_origins("*"), CorsOrigins::Any);
        assert_eq!(
            parse_cors_origins("https://a.example.com,*"),
            CorsOrigins::Any
        );
        assert_eq!(parse_cors_origins(" , "), CorsOrigins::Any);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("postgresql://"));
        assert!(!debug_output.contains("users_test"));
    }
}
