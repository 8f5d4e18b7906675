//! Tracked-change routes.

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::models::TrackedChangeDetail;
use crate::services::{ProposeChangeRequest, ResolveChangeRequest};
use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use uuid::Uuid;

pub fn changes_router() -> Router<AppState> {
    Router::new()
        .route(
            "/manuscripts/{id}/changes",
            get(list_changes).post(propose_change),
        )
        .route(
            "/manuscripts/{id}/changes/{change_id}",
            put(resolve_change).delete(delete_change),
        )
}

/// GET /manuscripts/{id}/changes - All tracked changes, newest first
#[utoipa::path(
    get,
    path = "/manuscripts/{id}/changes",
    tag = "Tracked Changes",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    responses(
        (status = 200, description = "Tracked changes with author and resolver", body = [TrackedChangeDetail]),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_changes(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<TrackedChangeDetail>> {
    let changes = state.changes.list(id, &auth.user).await?;
    Ok(ApiResponse::ok(changes))
}

/// POST /manuscripts/{id}/changes - Propose a change
#[utoipa::path(
    post,
    path = "/manuscripts/{id}/changes",
    tag = "Tracked Changes",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    request_body = ProposeChangeRequest,
    responses(
        (status = 201, description = "Change recorded as PENDING", body = TrackedChangeDetail),
        (status = 400, description = "Bad request - missing or invalid field"),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn propose_change(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ProposeChangeRequest>,
) -> ApiResult<TrackedChangeDetail> {
    let change = state.changes.propose(id, &auth.user, request).await?;
    Ok(ApiResponse::created(change).with_message("Tracked change created"))
}

/// PUT /manuscripts/{id}/changes/{change_id} - Accept or reject a pending change
#[utoipa::path(
    put,
    path = "/manuscripts/{id}/changes/{change_id}",
    tag = "Tracked Changes",
    params(
        ("id" = Uuid, Path, description = "Manuscript ID"),
        ("change_id" = String, Path, description = "Record id or client changeId")
    ),
    request_body = ResolveChangeRequest,
    responses(
        (status = 200, description = "Change resolved", body = TrackedChangeDetail),
        (status = 400, description = "Bad request - invalid status or already resolved"),
        (status = 404, description = "Change or manuscript not found, or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn resolve_change(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((id, change_id)): ApiPath<(Uuid, String)>,
    ApiJson(request): ApiJson<ResolveChangeRequest>,
) -> ApiResult<TrackedChangeDetail> {
    let change = state
        .changes
        .resolve(id, &change_id, &auth.user, request)
        .await?;
    let message = format!(
        "Tracked change {}",
        change.change.status.as_str().to_lowercase()
    );
    Ok(ApiResponse::ok(change).with_message(message))
}

/// DELETE /manuscripts/{id}/changes/{change_id} - Remove a change
#[utoipa::path(
    delete,
    path = "/manuscripts/{id}/changes/{change_id}",
    tag = "Tracked Changes",
    params(
        ("id" = Uuid, Path, description = "Manuscript ID"),
        ("change_id" = String, Path, description = "Record id or client changeId")
    ),
    responses(
        (status = 200, description = "Change deleted"),
        (status = 403, description = "Only the author or manuscript owner may delete"),
        (status = 404, description = "Change or manuscript not found, or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_change(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((id, change_id)): ApiPath<(Uuid, String)>,
) -> ApiResult<()> {
    state.changes.remove(id, &change_id, &auth.user).await?;
    Ok(ApiResponse::ok(()).with_message("Tracked change deleted"))
}
