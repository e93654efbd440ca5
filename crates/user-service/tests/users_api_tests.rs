//! User API integration tests.
//!
//! Exercises `/api/users` end to end over real HTTP using the
//! `TestUserServer` harness and an in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use user_service::observability::metrics::HTTP_REQUESTS_TOTAL;
use user_service::repositories::InMemoryUserStore;
use user_test_utils::TestUserServer;

async fn create(
    client: &reqwest::Client,
    server: &TestUserServer,
    id: &str,
    name: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(client
        .post(format!("{}/api/users", server.url()))
        .json(&json!({ "id": id, "name": name }))
        .send()
        .await?)
}

#[tokio::test]
async fn test_user_lifecycle() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn_in_memory().await?;
    let client = reqwest::Client::new();

    let response = create(&client, &server, "alice", "Alice").await?;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({ "id": "alice" }));

    let response = client
        .get(format!("{}/api/users/alice", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let user: Value = response.json().await?;
    assert_eq!(user["id"], "alice");
    assert_eq!(user["name"], "Alice");
    assert!(user["created_at"].is_string());

    let response = client
        .put(format!("{}/api/users/alice", server.url()))
        .json(&json!({ "name": "Alice Liddell" }))
        .send()
        .await?;
    assert_eq!(response.status(), 204);

    let user: Value = client
        .get(format!("{}/api/users/alice", server.url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(user["name"], "Alice Liddell");

    let response = client
        .delete(format!("{}/api/users/alice", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/api/users/alice", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_list_users_empty_and_ordered() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn_in_memory().await?;
    let client = reqwest::Client::new();

    let users: Value = client
        .get(format!("{}/api/users", server.url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(users, json!([]));

    for (id, name) in [("carol", "Carol"), ("alice", "Alice"), ("bob", "Bob")] {
        assert_eq!(create(&client, &server, id, name).await?.status(), 201);
    }

    let users: Vec<Value> = client
        .get(format!("{}/api/users", server.url()))
        .send()
        .await?
        .json()
        .await?;
    let ids: Vec<&str> = users.iter().filter_map(|u| u["id"].as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob", "carol"]);

    Ok(())
}

#[tokio::test]
async fn test_update_and_delete_missing_user_return_404() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn_in_memory().await?;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/api/users/ghost", server.url()))
        .json(&json!({ "name": "Nobody" }))
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let response = client
        .delete(format!("{}/api/users/ghost", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_create_validation() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn_in_memory().await?;
    let client = reqwest::Client::new();

    assert_eq!(create(&client, &server, "", "Alice").await?.status(), 400);
    assert_eq!(create(&client, &server, "alice", "").await?.status(), 400);

    let response = client
        .post(format!("{}/api/users", server.url()))
        .header("content-type", "application/json")
        .body("{\"id\": ")
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let response = client
        .put(format!("{}/api/users/alice", server.url()))
        .json(&json!({ "name": "" }))
        .send()
        .await?;
    assert_eq!(response.status(), 400);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_create_is_internal_error() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn_in_memory().await?;
    let client = reqwest::Client::new();

    assert_eq!(create(&client, &server, "alice", "Alice").await?.status(), 201);

    let response = create(&client, &server, "alice", "Impostor").await?;
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], "An internal error occurred");

    Ok(())
}

#[tokio::test]
async fn test_store_outage_returns_500_not_404() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryUserStore::new());
    let server = TestUserServer::spawn(store.clone()).await?;
    let client = reqwest::Client::new();

    store.set_available(false);

    let response = client
        .delete(format!("{}/api/users/alice", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 500);

    let response = client
        .put(format!("{}/api/users/alice", server.url()))
        .json(&json!({ "name": "Alice" }))
        .send()
        .await?;
    assert_eq!(response.status(), 500);

    Ok(())
}

#[tokio::test]
async fn test_slow_store_times_out_and_is_counted() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryUserStore::with_max_connections(2));
    let server =
        TestUserServer::spawn_with_vars(store.clone(), &[("STORE_TIMEOUT_MS", "50")]).await?;
    let client = reqwest::Client::new();

    store.set_latency(Duration::from_millis(500));

    for _ in 0..5 {
        let response = client
            .get(format!("{}/api/users", server.url()))
            .send()
            .await?;
        assert_eq!(response.status(), 500);
    }

    // Abandoned calls gave their connections back.
    assert_eq!(store.available_connections(), 2);

    store.set_latency(Duration::ZERO);
    let response = client
        .get(format!("{}/api/users", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let metrics = server.metrics();
    assert_eq!(
        metrics.value(
            HTTP_REQUESTS_TOTAL,
            &[("method", "GET"), ("route", "/api/users"), ("status_class", "5xx")],
        ),
        Some(5.0)
    );
    assert_eq!(
        metrics.value(
            HTTP_REQUESTS_TOTAL,
            &[("method", "GET"), ("route", "/api/users"), ("status_class", "2xx")],
        ),
        Some(1.0)
    );

    Ok(())
}

#[tokio::test]
async fn test_responses_carry_request_id() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn_in_memory().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/users/missing", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    assert!(response.headers().contains_key("x-request-id"));

    let response = client
        .get(format!("{}/api/users", server.url()))
        .header("x-request-id", "trace-me")
        .send()
        .await?;
    assert_eq!(response.headers()["x-request-id"], "trace-me");

    Ok(())
}
