//! User Service Library
//!
//! A small HTTP service exposing CRUD operations over a single `users`
//! resource, instrumented with request metrics and a liveness check.
//!
//! # Architecture
//!
//! The service follows the Handler -> Service -> Repository pattern:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//! ```
//!
//! Every request passes through the HTTP metrics middleware, which records
//! one counter increment and one latency observation per request against an
//! explicit [`observability::metrics::MetricRegistry`].
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Request/response and domain types
//! - `observability` - Metric registry, label normalization
//! - `repositories` - Store trait plus PostgreSQL and in-memory stores
//! - `routes` - Axum router setup
//! - `services` - Validation, deadlines, outcome mapping

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
