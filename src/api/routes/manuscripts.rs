//! Manuscript CRUD and activity routes.

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::models::{ActivityEntry, Manuscript};
use crate::services::{CreateManuscriptRequest, UpdateManuscriptRequest};
use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub fn manuscripts_router() -> Router<AppState> {
    Router::new()
        .route("/manuscripts", get(list_manuscripts).post(create_manuscript))
        .route(
            "/manuscripts/{id}",
            get(get_manuscript)
                .put(update_manuscript)
                .delete(delete_manuscript),
        )
        .route("/manuscripts/{id}/activity", get(get_activity))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityQuery {
    /// Maximum entries to return (default 20, max 100)
    pub limit: Option<usize>,
}

/// GET /manuscripts - Manuscripts the caller created or collaborates on
#[utoipa::path(
    get,
    path = "/manuscripts",
    tag = "Manuscripts",
    responses(
        (status = 200, description = "Manuscripts, most recently updated first", body = [Manuscript]),
        (status = 401, description = "Unauthorized - invalid or missing token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_manuscripts(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Vec<Manuscript>> {
    let manuscripts = state.manuscripts.list(&auth.user).await?;
    Ok(ApiResponse::ok(manuscripts))
}

/// POST /manuscripts - Create a manuscript owned by the caller
#[utoipa::path(
    post,
    path = "/manuscripts",
    tag = "Manuscripts",
    request_body = CreateManuscriptRequest,
    responses(
        (status = 201, description = "Manuscript created", body = Manuscript),
        (status = 400, description = "Bad request - missing title or invalid status"),
        (status = 401, description = "Unauthorized - invalid or missing token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_manuscript(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<CreateManuscriptRequest>,
) -> ApiResult<Manuscript> {
    let manuscript = state.manuscripts.create(&auth.user, request).await?;
    Ok(ApiResponse::created(manuscript).with_message("Manuscript created"))
}

/// GET /manuscripts/{id} - Fetch a manuscript the caller can view
#[utoipa::path(
    get,
    path = "/manuscripts/{id}",
    tag = "Manuscripts",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    responses(
        (status = 200, description = "Manuscript", body = Manuscript),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_manuscript(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Manuscript> {
    let manuscript = state.manuscripts.get(id, &auth.user).await?;
    Ok(ApiResponse::ok(manuscript))
}

/// PUT /manuscripts/{id} - Update title, content or status
#[utoipa::path(
    put,
    path = "/manuscripts/{id}",
    tag = "Manuscripts",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    request_body = UpdateManuscriptRequest,
    responses(
        (status = 200, description = "Manuscript updated", body = Manuscript),
        (status = 400, description = "Bad request - validation failed"),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_manuscript(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateManuscriptRequest>,
) -> ApiResult<Manuscript> {
    let manuscript = state.manuscripts.update(id, &auth.user, request).await?;
    Ok(ApiResponse::ok(manuscript).with_message("Manuscript updated"))
}

/// DELETE /manuscripts/{id} - Delete a manuscript and everything attached to it
#[utoipa::path(
    delete,
    path = "/manuscripts/{id}",
    tag = "Manuscripts",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    responses(
        (status = 200, description = "Manuscript deleted"),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_manuscript(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.manuscripts.delete(id, &auth.user).await?;
    Ok(ApiResponse::ok(()).with_message("Manuscript deleted"))
}

/// GET /manuscripts/{id}/activity - Recent activity entries
#[utoipa::path(
    get,
    path = "/manuscripts/{id}/activity",
    tag = "Manuscripts",
    params(("id" = Uuid, Path, description = "Manuscript ID"), ActivityQuery),
    responses(
        (status = 200, description = "Activity entries, newest first", body = [ActivityEntry]),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_activity(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> ApiResult<Vec<ActivityEntry>> {
    let entries = state
        .manuscripts
        .recent_activity(id, &auth.user, query.limit)
        .await?;
    Ok(ApiResponse::ok(entries))
}
