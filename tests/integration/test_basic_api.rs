//! Basic API integration tests

mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::Value;

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app();

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "ok");

    let response = app.server.get("/api/v1/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let app = spawn_app();

    let response = app.server.get("/api/v1/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let doc = response.json::<Value>();
    assert!(doc["paths"]["/manuscripts/{id}/versions/{version_id}/restore"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = spawn_app();

    let response = app.server.get("/api/v1/manuscripts").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);

    let response = app
        .server
        .get("/api/v1/manuscripts")
        .authorization_bearer("not-a-jwt")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_cannot_be_used_as_access_token() {
    let app = spawn_app();
    let user = app.user("Ada", "ada@example.org").await;
    let pair = app
        .state
        .jwt
        .generate_token_pair(user.user.id, &user.user.email, "s-1")
        .unwrap();

    let response = app
        .server
        .get("/api/v1/auth/me")
        .authorization_bearer(&pair.refresh_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_and_refresh() {
    let app = spawn_app();
    let user = app.user("Ada", "ada@example.org").await;

    let response = app
        .server
        .get("/api/v1/auth/me")
        .authorization_bearer(&user.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["email"], "ada@example.org");

    let pair = app
        .state
        .jwt
        .generate_token_pair(user.user.id, &user.user.email, "s-2")
        .unwrap();
    let response = app
        .server
        .post("/api/v1/auth/refresh")
        .json(&serde_json::json!({ "refreshToken": pair.refresh_token }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let refreshed = response.json::<Value>()["data"]["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .server
        .get("/api/v1/auth/me")
        .authorization_bearer(&refreshed)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = spawn_app();
    let user = app.user("Ada", "ada@example.org").await;

    let response = app
        .server
        .post("/api/v1/manuscripts")
        .authorization_bearer(&user.token)
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_orcid_validation_happens_before_any_upstream_call() {
    let app = spawn_app();
    let user = app.user("Ada", "ada@example.org").await;

    let response = app
        .server
        .get("/api/v1/orcid/search")
        .add_query_param("q", "  ")
        .authorization_bearer(&user.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .get("/api/v1/orcid/0000-0002-1825-0098")
        .authorization_bearer(&user.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
