//! Authenticated caller extractor.

use super::app_state::AppState;
use super::error::ApiError;
use crate::models::User;
use crate::services::jwt_service::JwtService;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};

/// The user behind a valid access token.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user: User,
    pub session_id: String,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(JwtService::extract_bearer_token)
            .ok_or_else(|| {
                tracing::warn!("No authorization token provided");
                ApiError::unauthorized()
            })?;

        let claims = state.jwt.validate_access_token(token).map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            ApiError::unauthorized()
        })?;
        let user_id = claims.user_id().map_err(|e| {
            tracing::warn!("JWT subject rejected: {}", e);
            ApiError::unauthorized()
        })?;

        let user = state
            .storage
            .get_user(user_id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load user {}: {}", user_id, e);
                ApiError::internal()
            })?
            .ok_or_else(|| {
                tracing::warn!("Token subject {} has no user record", user_id);
                ApiError::unauthorized()
            })?;

        Ok(AuthContext {
            user,
            session_id: claims.session_id,
        })
    }
}
