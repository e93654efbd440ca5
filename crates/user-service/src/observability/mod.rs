//! Observability module for the User Service.
//!
//! Metrics live in an explicit [`metrics::MetricRegistry`] owned by the
//! process and handed to the HTTP middleware and the `/metrics` endpoint.

pub mod metrics;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
