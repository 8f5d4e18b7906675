//! API routes module - organizes all route handlers.
//!
//! Every route except health and the OpenAPI document requires a bearer token.

pub mod app_state;
pub mod auth;
pub mod auth_context;
pub mod changes;
pub mod collaborators;
pub mod error;
pub mod invitations;
pub mod manuscripts;
pub mod notifications;
pub mod openapi;
pub mod orcid;
pub mod versions;

use crate::config::AppConfig;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

pub use app_state::AppState;
pub use auth_context::AuthContext;
pub use error::{ApiError, ApiResponse};

/// Create the API router combining all route modules. Mounted under `/api/v1`.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth::auth_router())
        .merge(manuscripts::manuscripts_router())
        .merge(changes::changes_router())
        .merge(versions::versions_router())
        .merge(collaborators::collaborators_router())
        .merge(invitations::invitations_router())
        .merge(notifications::notifications_router())
        .merge(orcid::orcid_router())
        .merge(openapi::openapi_router())
}

/// Root health check plus the API under `/api/v1`, with state applied.
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_api_router())
        .with_state(app_state)
}

/// In-memory application state. Call `init_storage` to switch to PostgreSQL.
pub fn create_app_state(config: &AppConfig) -> AppState {
    AppState::new(config)
}

/// Application state with storage connected according to `config`.
pub async fn create_app_state_with_storage(
    config: &AppConfig,
) -> Result<AppState, crate::storage::StorageError> {
    AppState::new(config)
        .init_storage(config.database_url.as_deref())
        .await
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
