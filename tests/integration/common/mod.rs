//! Shared helpers for HTTP integration tests.
#![allow(dead_code)]

use axum_test::{TestResponse, TestServer};
use manuscript_api::config::AppConfig;
use manuscript_api::models::User;
use manuscript_api::routes::{self, AppState};
use serde_json::{Value, json};

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

pub struct TestUser {
    pub user: User,
    pub token: String,
}

pub fn spawn_app() -> TestApp {
    let state = routes::create_app_state(&AppConfig::development());
    let server = TestServer::new(routes::create_app(state.clone())).unwrap();
    TestApp { server, state }
}

impl TestApp {
    pub async fn user(&self, name: &str, email: &str) -> TestUser {
        self.register(User::new(name, email)).await
    }

    pub async fn register(&self, user: User) -> TestUser {
        let user = self.state.storage.create_user(user).await.unwrap();
        let token = self
            .state
            .jwt
            .generate_token_pair(user.id, &user.email, "test-session")
            .unwrap()
            .access_token;
        TestUser { user, token }
    }

    /// Create a manuscript through the API and return its JSON.
    pub async fn manuscript(&self, owner: &TestUser, title: &str, content: &str) -> Value {
        let response = self
            .server
            .post("/api/v1/manuscripts")
            .authorization_bearer(&owner.token)
            .json(&json!({ "title": title, "content": content }))
            .await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        response.json::<Value>()["data"].clone()
    }

    /// Invite `invitee` by email and have them accept.
    pub async fn add_collaborator(
        &self,
        owner: &TestUser,
        manuscript_id: &str,
        invitee: &TestUser,
        body: Value,
    ) {
        let mut body = body;
        body["email"] = json!(invitee.user.email);
        let invite = self
            .server
            .post(&format!("/api/v1/manuscripts/{}/invitations", manuscript_id))
            .authorization_bearer(&owner.token)
            .json(&body)
            .await;
        assert_eq!(invite.status_code(), 201, "{}", invite.text());
        let invitation_id = invite.json::<Value>()["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let accept = self
            .server
            .post(&format!("/api/v1/invitations/{}/respond", invitation_id))
            .authorization_bearer(&invitee.token)
            .json(&json!({ "accept": true }))
            .await;
        assert_eq!(accept.status_code(), 200, "{}", accept.text());
    }
}

pub fn data(response: &TestResponse) -> Value {
    response.json::<Value>()["data"].clone()
}

pub fn error_message(response: &TestResponse) -> String {
    response.json::<Value>()["error"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
