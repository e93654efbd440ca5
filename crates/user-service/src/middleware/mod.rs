//! Middleware for the User Service.
//!
//! - `http_metrics` - per-request counter and latency recording

pub mod http_metrics;

pub use http_metrics::http_metrics_middleware;
