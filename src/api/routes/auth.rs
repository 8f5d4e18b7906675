//! Token refresh and caller identity routes.
//!
//! Access tokens are issued by the identity layer; this API only validates
//! them, exchanges refresh tokens, and reports who the caller is.

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::models::User;
use crate::services::TokenPair;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/me", get(get_current_user))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// POST /auth/refresh - Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Authentication",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> ApiResult<TokenPair> {
    let (claims, user_id) = state
        .jwt
        .validate_refresh_token(&request.refresh_token)
        .and_then(|claims| claims.user_id().map(|id| (claims, id)))
        .map_err(|e| {
            warn!("Refresh token rejected: {}", e);
            ApiError::new(StatusCode::UNAUTHORIZED, "Invalid or expired refresh token")
        })?;

    let known = state
        .storage
        .get_user(user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user {}: {}", user_id, e);
            ApiError::internal()
        })?
        .is_some();
    if !known {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Unknown user"));
    }

    let pair = state.jwt.reissue(&claims).map_err(|e| {
        tracing::error!("Failed to issue token pair: {}", e);
        ApiError::internal()
    })?;
    info!(user_id = %user_id, session_id = %claims.session_id, "Access token refreshed");
    Ok(ApiResponse::ok(pair))
}

/// GET /auth/me - The authenticated user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized - invalid or missing token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_current_user(auth: AuthContext) -> ApiResult<User> {
    Ok(ApiResponse::ok(auth.user))
}
