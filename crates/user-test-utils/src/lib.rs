//! # User Service Test Utilities
//!
//! Shared test utilities for the User Service.
//!
//! This crate provides:
//! - Server test harness (`TestUserServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use user_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let server = TestUserServer::spawn_in_memory().await?;
//!     let client = reqwest::Client::new();
//!
//!     let response = client
//!         .get(&format!("{}/health", server.url()))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;

// Re-export commonly used items
pub use server_harness::*;
