//! Invitation routes.

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::models::Invitation;
use crate::services::{CreateInvitationRequest, InvitationResponse, RespondInvitationRequest};
use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use uuid::Uuid;

pub fn invitations_router() -> Router<AppState> {
    Router::new()
        .route(
            "/manuscripts/{id}/invitations",
            get(list_manuscript_invitations).post(create_invitation),
        )
        .route("/invitations", get(list_my_invitations))
        .route("/invitations/{id}/respond", post(respond_to_invitation))
}

/// GET /manuscripts/{id}/invitations
#[utoipa::path(
    get,
    path = "/manuscripts/{id}/invitations",
    tag = "Invitations",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    responses(
        (status = 200, description = "Invitations for the manuscript", body = [Invitation]),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_manuscript_invitations(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<Invitation>> {
    let invitations = state.invitations.list_for_manuscript(id, &auth.user).await?;
    Ok(ApiResponse::ok(invitations))
}

/// POST /manuscripts/{id}/invitations - Invite by email or ORCID iD
#[utoipa::path(
    post,
    path = "/manuscripts/{id}/invitations",
    tag = "Invitations",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    request_body = CreateInvitationRequest,
    responses(
        (status = 201, description = "Invitation sent", body = Invitation),
        (status = 400, description = "Bad request - invalid invitee, duplicate, or already collaborating"),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_invitation(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateInvitationRequest>,
) -> ApiResult<Invitation> {
    let invitation = state.invitations.invite(id, &auth.user, request).await?;
    Ok(ApiResponse::created(invitation).with_message("Invitation sent"))
}

/// GET /invitations - Pending invitations addressed to the caller
#[utoipa::path(
    get,
    path = "/invitations",
    tag = "Invitations",
    responses(
        (status = 200, description = "Pending, unexpired invitations", body = [Invitation]),
        (status = 401, description = "Unauthorized - invalid or missing token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_invitations(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Vec<Invitation>> {
    let invitations = state.invitations.list_mine(&auth.user).await?;
    Ok(ApiResponse::ok(invitations))
}

/// POST /invitations/{id}/respond - Accept or decline
#[utoipa::path(
    post,
    path = "/invitations/{id}/respond",
    tag = "Invitations",
    params(("id" = Uuid, Path, description = "Invitation ID")),
    request_body = RespondInvitationRequest,
    responses(
        (status = 200, description = "Invitation answered", body = InvitationResponse),
        (status = 400, description = "Bad request - not pending or expired"),
        (status = 404, description = "Invitation not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn respond_to_invitation(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RespondInvitationRequest>,
) -> ApiResult<InvitationResponse> {
    let response = state.invitations.respond(id, &auth.user, request).await?;
    let message = if response.collaborator.is_some() {
        "Invitation accepted"
    } else {
        "Invitation declined"
    };
    Ok(ApiResponse::ok(response).with_message(message))
}
