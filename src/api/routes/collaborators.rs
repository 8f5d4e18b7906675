//! Collaborator roster routes.

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::models::CollaboratorDetail;
use crate::services::UpdateCollaboratorRequest;
use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use uuid::Uuid;

pub fn collaborators_router() -> Router<AppState> {
    Router::new()
        .route("/manuscripts/{id}/collaborators", get(list_collaborators))
        .route(
            "/manuscripts/{id}/collaborators/{user_id}",
            put(update_collaborator).delete(remove_collaborator),
        )
}

/// GET /manuscripts/{id}/collaborators
#[utoipa::path(
    get,
    path = "/manuscripts/{id}/collaborators",
    tag = "Collaborators",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    responses(
        (status = 200, description = "Collaborators with user summaries", body = [CollaboratorDetail]),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_collaborators(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<CollaboratorDetail>> {
    let collaborators = state.collaborators.list(id, &auth.user).await?;
    Ok(ApiResponse::ok(collaborators))
}

/// PUT /manuscripts/{id}/collaborators/{user_id} - Change role or permission flags
#[utoipa::path(
    put,
    path = "/manuscripts/{id}/collaborators/{user_id}",
    tag = "Collaborators",
    params(
        ("id" = Uuid, Path, description = "Manuscript ID"),
        ("user_id" = Uuid, Path, description = "Collaborating user's ID")
    ),
    request_body = UpdateCollaboratorRequest,
    responses(
        (status = 200, description = "Collaborator updated", body = CollaboratorDetail),
        (status = 400, description = "Bad request - invalid role"),
        (status = 403, description = "Only the owner or an admin can manage collaborators"),
        (status = 404, description = "Collaborator or manuscript not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_collaborator(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((id, user_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(request): ApiJson<UpdateCollaboratorRequest>,
) -> ApiResult<CollaboratorDetail> {
    let collaborator = state
        .collaborators
        .update(id, user_id, &auth.user, request)
        .await?;
    Ok(ApiResponse::ok(collaborator).with_message("Collaborator updated"))
}

/// DELETE /manuscripts/{id}/collaborators/{user_id}
#[utoipa::path(
    delete,
    path = "/manuscripts/{id}/collaborators/{user_id}",
    tag = "Collaborators",
    params(
        ("id" = Uuid, Path, description = "Manuscript ID"),
        ("user_id" = Uuid, Path, description = "Collaborating user's ID")
    ),
    responses(
        (status = 200, description = "Collaborator removed"),
        (status = 400, description = "The manuscript owner cannot be removed"),
        (status = 403, description = "Only the owner or an admin can manage collaborators"),
        (status = 404, description = "Collaborator or manuscript not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_collaborator(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((id, user_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    state.collaborators.remove(id, user_id, &auth.user).await?;
    Ok(ApiResponse::ok(()).with_message("Collaborator removed"))
}
