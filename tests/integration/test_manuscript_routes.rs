//! Manuscript CRUD, access control and collaborator roster tests

mod common;

use axum::http::StatusCode;
use common::{data, error_message, spawn_app};
use serde_json::{Value, json};

#[tokio::test]
async fn test_create_and_get_manuscript() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;

    let manuscript = app
        .manuscript(&owner, "On Engines", "<p>The analytical engine</p>")
        .await;
    assert_eq!(manuscript["status"], "DRAFT");
    assert_eq!(manuscript["wordCount"], 3);
    assert_eq!(manuscript["createdBy"], owner.user.id.to_string());

    let id = manuscript["id"].as_str().unwrap();
    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&owner.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "On Engines");
}

#[tokio::test]
async fn test_create_requires_title() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;

    let response = app
        .server
        .post("/api/v1/manuscripts")
        .authorization_bearer(&owner.token)
        .json(&json!({ "content": "<p>untitled</p>" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&response), "Missing required field: title");
}

#[tokio::test]
async fn test_outsider_gets_conflated_not_found() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let outsider = app.user("Eve", "eve@example.org").await;
    let manuscript = app.manuscript(&owner, "Private", "").await;
    let id = manuscript["id"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&outsider.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let hidden = error_message(&response);

    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}", uuid::Uuid::new_v4()))
        .authorization_bearer(&outsider.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(&response), hidden);
    assert_eq!(hidden, "Manuscript not found or insufficient permissions");
}

#[tokio::test]
async fn test_invalid_uuid_path_is_bad_request() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;

    let response = app
        .server
        .get("/api/v1/manuscripts/not-a-uuid")
        .authorization_bearer(&owner.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_recomputes_word_count() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let manuscript = app.manuscript(&owner, "Draft", "<p>one</p>").await;
    let id = manuscript["id"].as_str().unwrap();

    let response = app
        .server
        .put(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&owner.token)
        .json(&json!({ "content": "<p>one two</p><p>three</p>", "status": "IN_REVIEW" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = data(&response);
    assert_eq!(updated["wordCount"], 3);
    assert_eq!(updated["status"], "IN_REVIEW");
}

#[tokio::test]
async fn test_list_includes_collaborations() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let colleague = app.user("Charles", "charles@example.org").await;
    let shared = app.manuscript(&owner, "Shared", "").await;
    app.manuscript(&owner, "Solo", "").await;
    app.manuscript(&colleague, "Own", "").await;

    app.add_collaborator(&owner, shared["id"].as_str().unwrap(), &colleague, json!({}))
        .await;

    let response = app
        .server
        .get("/api/v1/manuscripts")
        .authorization_bearer(&colleague.token)
        .await;
    let titles: Vec<String> = data(&response)
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Shared".to_string()));
    assert!(titles.contains(&"Own".to_string()));
}

#[tokio::test]
async fn test_delete_requires_delete_permission() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let editor = app.user("Charles", "charles@example.org").await;
    let manuscript = app.manuscript(&owner, "Doomed", "").await;
    let id = manuscript["id"].as_str().unwrap();
    app.add_collaborator(&owner, id, &editor, json!({ "role": "EDITOR" }))
        .await;

    let response = app
        .server
        .delete(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&editor.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .delete(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&owner.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&owner.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collaborator_management() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let editor = app.user("Charles", "charles@example.org").await;
    let viewer = app.user("Mary", "mary@example.org").await;
    let manuscript = app.manuscript(&owner, "Team", "").await;
    let id = manuscript["id"].as_str().unwrap();
    app.add_collaborator(&owner, id, &editor, json!({ "role": "EDITOR" }))
        .await;
    app.add_collaborator(&owner, id, &viewer, json!({ "role": "VIEWER" }))
        .await;

    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}/collaborators", id))
        .authorization_bearer(&viewer.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let roster = data(&response);
    assert_eq!(roster.as_array().unwrap().len(), 2);
    assert!(roster[0]["user"]["email"].is_string());

    // An EDITOR is not a manager
    let response = app
        .server
        .put(&format!("/api/v1/manuscripts/{}/collaborators/{}", id, viewer.user.id))
        .authorization_bearer(&editor.token)
        .json(&json!({ "canEdit": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&format!("/api/v1/manuscripts/{}/collaborators/{}", id, viewer.user.id))
        .authorization_bearer(&owner.token)
        .json(&json!({ "role": "REVIEWER", "canEdit": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(data(&response)["role"], "REVIEWER");
    assert_eq!(data(&response)["canEdit"], true);

    // The owner cannot be removed
    let response = app
        .server
        .delete(&format!("/api/v1/manuscripts/{}/collaborators/{}", id, owner.user.id))
        .authorization_bearer(&owner.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // A collaborator may leave
    let response = app
        .server
        .delete(&format!("/api/v1/manuscripts/{}/collaborators/{}", id, viewer.user.id))
        .authorization_bearer(&viewer.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&viewer.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admins_cannot_escalate_through_the_roster() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let admin = app.user("Mary", "mary@example.org").await;
    let viewer = app.user("Charles", "charles@example.org").await;
    let manuscript = app.manuscript(&owner, "Team", "").await;
    let id = manuscript["id"].as_str().unwrap();
    app.add_collaborator(&owner, id, &admin, json!({ "role": "ADMIN" }))
        .await;
    app.add_collaborator(&owner, id, &viewer, json!({ "role": "VIEWER" }))
        .await;
    let admin_path = format!("/api/v1/manuscripts/{}/collaborators/{}", id, admin.user.id);
    let viewer_path = format!("/api/v1/manuscripts/{}/collaborators/{}", id, viewer.user.id);

    let response = app
        .server
        .put(&admin_path)
        .authorization_bearer(&admin.token)
        .json(&json!({ "canDelete": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(error_message(&response), "You cannot change your own permissions");

    let response = app
        .server
        .delete(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&admin.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .put(&viewer_path)
        .authorization_bearer(&admin.token)
        .json(&json!({ "role": "OWNER" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&viewer_path)
        .authorization_bearer(&admin.token)
        .json(&json!({ "canDelete": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        error_message(&response),
        "Cannot grant canDelete without holding it"
    );

    // Flags the admin holds can be handed on
    let response = app
        .server
        .put(&viewer_path)
        .authorization_bearer(&admin.token)
        .json(&json!({ "role": "EDITOR", "canEdit": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    assert_eq!(data(&response)["canEdit"], true);

    // The creator can promote to owner, after which admins cannot touch the record
    let response = app
        .server
        .put(&viewer_path)
        .authorization_bearer(&owner.token)
        .json(&json!({ "role": "OWNER", "canDelete": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    assert_eq!(data(&response)["role"], "OWNER");

    let response = app
        .server
        .put(&viewer_path)
        .authorization_bearer(&admin.token)
        .json(&json!({ "canDelete": false }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .delete(&viewer_path)
        .authorization_bearer(&admin.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_activity_feed_records_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = manuscript_api::config::AppConfig::development();
    config.activity_log_path = Some(dir.path().join("activity.jsonl"));
    let state = manuscript_api::routes::create_app_state(&config);
    let server =
        axum_test::TestServer::new(manuscript_api::routes::create_app(state.clone())).unwrap();

    let owner = state
        .storage
        .create_user(manuscript_api::models::User::new("Ada", "ada@example.org"))
        .await
        .unwrap();
    let token = state
        .jwt
        .generate_token_pair(owner.id, &owner.email, "s")
        .unwrap()
        .access_token;

    let response = server
        .post("/api/v1/manuscripts")
        .authorization_bearer(&token)
        .json(&json!({ "title": "Logged" }))
        .await;
    let id = data(&response)["id"].as_str().unwrap().to_string();
    server
        .post(&format!("/api/v1/manuscripts/{}/versions", id))
        .authorization_bearer(&token)
        .json(&json!({}))
        .await;

    let response = server
        .get(&format!("/api/v1/manuscripts/{}/activity", id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let actions: Vec<String> = data(&response)
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(actions, vec!["version.created", "manuscript.created"]);
}
