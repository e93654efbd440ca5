//! User Service models.
//!
//! Contains the stored `User` type and the request/response bodies of the
//! HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored user.
///
/// `id` is caller-supplied and unique; `created_at` is set by the store on
/// creation and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/users`.
///
/// Missing fields deserialize as empty strings so that they fail the same
/// non-empty validation as explicitly empty ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Response of `POST /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub id: String,
}

/// Body of `PUT /api/users/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: String,
}

/// Liveness check response.
///
/// `status` is `"ok"` when the store answered within the health deadline,
/// `"unhealthy"` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_user_serializes_created_at_as_rfc3339() {
        let user = User {
            id: "u1".to_string(),
            name: "Ann".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["created_at"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_create_request_missing_fields_default_to_empty() {
        let request: CreateUserRequest = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap();
        assert_eq!(request.id, "");
        assert_eq!(request.name, "Ann");
    }

    #[test]
    fn test_update_request_ignores_unknown_fields() {
        let request: UpdateUserRequest =
            serde_json::from_str(r#"{"name":"Ann2","id":"ignored"}"#).unwrap();
        assert_eq!(request.name, "Ann2");
    }
}
