//! Service layer for the User Service.
//!
//! Validates input, bounds every store call with a deadline, and turns
//! store results into [`crate::errors::UserServiceError`] outcomes.

pub mod deadline;
pub mod user_service;
