//! Notification inbox routes.

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::models::Notification;
use crate::services::{MarkedRead, UnreadCount};
use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub fn notifications_router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    /// Default 50, max 100
    pub limit: Option<i64>,
}

/// GET /notifications
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = [Notification]),
        (status = 401, description = "Unauthorized - invalid or missing token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> ApiResult<Vec<Notification>> {
    let notifications = state
        .notifications
        .list(&auth.user, query.unread_only, query.limit)
        .await?;
    Ok(ApiResponse::ok(notifications))
}

/// GET /notifications/unread-count
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "Notifications",
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCount)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<UnreadCount> {
    let count = state.notifications.unread_count(&auth.user).await?;
    Ok(ApiResponse::ok(count))
}

/// POST /notifications/{id}/read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.notifications.mark_read(&auth.user, id).await?;
    Ok(ApiResponse::ok(()).with_message("Notification marked as read"))
}

/// POST /notifications/read-all
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, description = "Number of notifications marked read", body = MarkedRead)
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<MarkedRead> {
    let marked = state.notifications.mark_all_read(&auth.user).await?;
    Ok(ApiResponse::ok(marked))
}
