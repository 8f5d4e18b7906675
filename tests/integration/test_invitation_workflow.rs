//! Invitation workflow tests: invite, list, accept, decline, expiry

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{TestApp, TestUser, data, error_message, spawn_app};
use manuscript_api::models::{CollaboratorRole, Invitation, InvitationStatus, User};
use serde_json::{Value, json};
use uuid::Uuid;

async fn invite(app: &TestApp, inviter: &TestUser, manuscript_id: &str, body: Value) -> axum_test::TestResponse {
    app.server
        .post(&format!("/api/v1/manuscripts/{}/invitations", manuscript_id))
        .authorization_bearer(&inviter.token)
        .json(&body)
        .await
}

async fn respond(app: &TestApp, user: &TestUser, invitation_id: &str, accept: bool) -> axum_test::TestResponse {
    app.server
        .post(&format!("/api/v1/invitations/{}/respond", invitation_id))
        .authorization_bearer(&user.token)
        .json(&json!({ "accept": accept }))
        .await
}

#[tokio::test]
async fn test_invite_by_email_defaults_role_and_grants() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let manuscript = app.manuscript(&owner, "Paper", "").await;
    let id = manuscript["id"].as_str().unwrap();

    let response = invite(&app, &owner, id, json!({ "email": "Grace@Example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    let invitation = data(&response);
    assert_eq!(invitation["status"], "PENDING");
    assert_eq!(invitation["role"], "CONTRIBUTOR");
    assert_eq!(invitation["inviteeEmail"], "grace@example.org");
    assert_eq!(invitation["canEdit"], true);
    assert_eq!(invitation["canInvite"], false);
    assert_eq!(invitation["canDelete"], false);
    assert!(invitation.get("token").is_none());

    let response = invite(
        &app,
        &owner,
        id,
        json!({ "email": "linus@example.org", "role": "REVIEWER", "canEdit": true }),
    )
    .await;
    let invitation = data(&response);
    assert_eq!(invitation["role"], "REVIEWER");
    assert_eq!(invitation["canEdit"], true);

    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}/invitations", id))
        .authorization_bearer(&owner.token)
        .await;
    assert_eq!(data(&response).as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invite_validation() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let manuscript = app.manuscript(&owner, "Paper", "").await;
    let id = manuscript["id"].as_str().unwrap();

    for body in [
        json!({}),
        json!({ "email": "not-an-address" }),
        json!({ "orcidId": "0000-0002-1825-0098" }),
        json!({ "email": "grace@example.org", "role": "SUPERVISOR" }),
    ] {
        let response = invite(&app, &owner, id, body.clone()).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{}", body);
    }

    let response = invite(&app, &owner, id, json!({ "email": "grace@example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let response = invite(&app, &owner, id, json!({ "email": "GRACE@example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&response),
        "A pending invitation already exists for this invitee"
    );

    // The creator is already on the manuscript
    let response = invite(&app, &owner, id, json!({ "email": "ada@example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_inviters_may_invite() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let editor = app.user("Charles", "charles@example.org").await;
    let admin = app.user("Mary", "mary@example.org").await;
    let manuscript = app.manuscript(&owner, "Paper", "").await;
    let id = manuscript["id"].as_str().unwrap();
    app.add_collaborator(&owner, id, &editor, json!({ "role": "EDITOR" }))
        .await;
    app.add_collaborator(&owner, id, &admin, json!({ "role": "ADMIN" }))
        .await;

    let response = invite(&app, &editor, id, json!({ "email": "x@example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = invite(&app, &admin, id, json!({ "email": "x@example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    // Existing collaborators cannot be invited twice
    let response = invite(&app, &admin, id, json!({ "email": "charles@example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&response),
        "User is already a collaborator on this manuscript"
    );
}

#[tokio::test]
async fn test_inviters_cannot_grant_beyond_their_own_rights() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let admin = app.user("Mary", "mary@example.org").await;
    let scout = app.user("Charles", "charles@example.org").await;
    let manuscript = app.manuscript(&owner, "Paper", "").await;
    let id = manuscript["id"].as_str().unwrap();
    app.add_collaborator(&owner, id, &admin, json!({ "role": "ADMIN" }))
        .await;
    app.add_collaborator(
        &owner,
        id,
        &scout,
        json!({ "role": "VIEWER", "canInvite": true }),
    )
    .await;

    let response = invite(&app, &admin, id, json!({ "email": "x@example.org", "role": "OWNER" })).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        error_message(&response),
        "Only the manuscript creator can assign the OWNER role"
    );

    let response = invite(
        &app,
        &admin,
        id,
        json!({ "email": "x@example.org", "role": "EDITOR", "canDelete": true }),
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        error_message(&response),
        "Cannot grant canDelete without holding it"
    );

    let response = invite(
        &app,
        &admin,
        id,
        json!({ "email": "x@example.org", "role": "EDITOR", "canInvite": true }),
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    assert_eq!(data(&response)["canInvite"], true);

    // Role defaults are capped to what the inviter holds
    let response = invite(&app, &scout, id, json!({ "email": "y@example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    assert_eq!(data(&response)["role"], "CONTRIBUTOR");
    assert_eq!(data(&response)["canEdit"], false);

    let response = invite(&app, &owner, id, json!({ "email": "z@example.org", "role": "OWNER" })).await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    assert_eq!(data(&response)["canDelete"], true);
}

#[tokio::test]
async fn test_accept_by_orcid_grants_access_and_notifies_inviter() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let invitee = app
        .register(User::new("Josiah", "josiah@example.org").with_orcid("0000-0002-1825-0097"))
        .await;
    let manuscript = app.manuscript(&owner, "Paper", "").await;
    let id = manuscript["id"].as_str().unwrap();

    // Not yet visible to the invitee
    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&invitee.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = invite(
        &app,
        &owner,
        id,
        json!({ "orcidId": "https://orcid.org/0000-0002-1825-0097", "role": "EDITOR" }),
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    let invitation = data(&response);
    assert_eq!(invitation["inviteeOrcid"], "0000-0002-1825-0097");

    let response = app
        .server
        .get("/api/v1/invitations")
        .authorization_bearer(&invitee.token)
        .await;
    let mine = data(&response);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["id"], invitation["id"]);

    let response = respond(&app, &invitee, invitation["id"].as_str().unwrap(), true).await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let outcome = data(&response);
    assert_eq!(outcome["invitation"]["status"], "ACCEPTED");
    assert!(outcome["invitation"]["respondedAt"].is_string());
    assert_eq!(outcome["collaborator"]["role"], "EDITOR");
    assert_eq!(outcome["collaborator"]["userId"], invitee.user.id.to_string());

    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&invitee.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Answered invitations leave the inbox and cannot be answered again
    let response = app
        .server
        .get("/api/v1/invitations")
        .authorization_bearer(&invitee.token)
        .await;
    assert!(data(&response).as_array().unwrap().is_empty());
    let response = respond(&app, &invitee, invitation["id"].as_str().unwrap(), false).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .get("/api/v1/notifications")
        .authorization_bearer(&owner.token)
        .await;
    let notifications = data(&response);
    assert_eq!(notifications[0]["type"], "COLLABORATOR_ADDED");
}

#[tokio::test]
async fn test_decline_leaves_no_collaborator() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let invitee = app.user("Grace", "grace@example.org").await;
    let manuscript = app.manuscript(&owner, "Paper", "").await;
    let id = manuscript["id"].as_str().unwrap();

    let invitation = data(&invite(&app, &owner, id, json!({ "email": "grace@example.org" })).await);
    let response = respond(&app, &invitee, invitation["id"].as_str().unwrap(), false).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let outcome = data(&response);
    assert_eq!(outcome["invitation"]["status"], "DECLINED");
    assert!(outcome.get("collaborator").is_none());

    let response = app
        .server
        .get(&format!("/api/v1/manuscripts/{}", id))
        .authorization_bearer(&invitee.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // A declined invitation no longer blocks a fresh one
    let response = invite(&app, &owner, id, json!({ "email": "grace@example.org" })).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_cannot_answer_someone_elses_invitation() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let stranger = app.user("Eve", "eve@example.org").await;
    let manuscript = app.manuscript(&owner, "Paper", "").await;
    let id = manuscript["id"].as_str().unwrap();

    let invitation = data(&invite(&app, &owner, id, json!({ "email": "grace@example.org" })).await);
    let response = respond(&app, &stranger, invitation["id"].as_str().unwrap(), true).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = respond(&app, &stranger, &Uuid::new_v4().to_string(), true).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .post(&format!(
            "/api/v1/invitations/{}/respond",
            invitation["id"].as_str().unwrap()
        ))
        .authorization_bearer(&stranger.token)
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_invitation_is_marked_and_rejected() {
    let app = spawn_app();
    let owner = app.user("Ada", "ada@example.org").await;
    let invitee = app.user("Grace", "grace@example.org").await;
    let manuscript = app.manuscript(&owner, "Paper", "").await;
    let manuscript_id = Uuid::parse_str(manuscript["id"].as_str().unwrap()).unwrap();

    let sent_at = Utc::now() - Duration::days(10);
    let invitation = app
        .state
        .storage
        .create_invitation(Invitation {
            id: Uuid::new_v4(),
            manuscript_id,
            inviter_id: owner.user.id,
            invitee_email: Some("grace@example.org".to_string()),
            invitee_orcid: None,
            invitee_name: None,
            role: CollaboratorRole::Viewer,
            can_edit: false,
            can_invite: false,
            can_delete: false,
            message: None,
            status: InvitationStatus::Pending,
            token: Uuid::new_v4().simple().to_string(),
            expires_at: Invitation::expiry_from(sent_at),
            created_at: sent_at,
            responded_at: None,
        })
        .await
        .unwrap();

    // Expired invitations are hidden from the inbox
    let response = app
        .server
        .get("/api/v1/invitations")
        .authorization_bearer(&invitee.token)
        .await;
    assert!(data(&response).as_array().unwrap().is_empty());

    let response = respond(&app, &invitee, &invitation.id.to_string(), true).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&response), "Invitation has expired");

    let stored = app
        .state
        .storage
        .get_invitation(invitation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, InvitationStatus::Expired);
    assert!(
        app.state
            .storage
            .get_collaborator(manuscript_id, invitee.user.id)
            .await
            .unwrap()
            .is_none()
    );
}
