//! Version snapshot and restore routes.

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::models::{ManuscriptVersion, VersionSummary};
use crate::services::{CreateVersionRequest, RestoreResult};
use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use uuid::Uuid;

pub fn versions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/manuscripts/{id}/versions",
            get(list_versions).post(create_version),
        )
        .route("/manuscripts/{id}/versions/{version_id}", get(get_version))
        .route(
            "/manuscripts/{id}/versions/{version_id}/restore",
            post(restore_version),
        )
}

/// GET /manuscripts/{id}/versions - Version metadata, newest first
#[utoipa::path(
    get,
    path = "/manuscripts/{id}/versions",
    tag = "Versions",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    responses(
        (status = 200, description = "Version summaries without content", body = [VersionSummary]),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_versions(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<VersionSummary>> {
    let versions = state.versions.list_versions(id, &auth.user).await?;
    Ok(ApiResponse::ok(versions))
}

/// POST /manuscripts/{id}/versions - Save a snapshot
#[utoipa::path(
    post,
    path = "/manuscripts/{id}/versions",
    tag = "Versions",
    params(("id" = Uuid, Path, description = "Manuscript ID")),
    request_body = CreateVersionRequest,
    responses(
        (status = 201, description = "Version created", body = ManuscriptVersion),
        (status = 400, description = "Bad request - invalid versionType"),
        (status = 404, description = "Manuscript not found or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_version(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateVersionRequest>,
) -> ApiResult<ManuscriptVersion> {
    let version = state.versions.create_version(id, &auth.user, request).await?;
    Ok(ApiResponse::created(version).with_message("Version created"))
}

/// GET /manuscripts/{id}/versions/{version_id} - Full snapshot
#[utoipa::path(
    get,
    path = "/manuscripts/{id}/versions/{version_id}",
    tag = "Versions",
    params(
        ("id" = Uuid, Path, description = "Manuscript ID"),
        ("version_id" = Uuid, Path, description = "Version ID")
    ),
    responses(
        (status = 200, description = "Version including content and changes", body = ManuscriptVersion),
        (status = 404, description = "Version or manuscript not found, or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_version(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((id, version_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<ManuscriptVersion> {
    let version = state.versions.get_version(id, version_id, &auth.user).await?;
    Ok(ApiResponse::ok(version))
}

/// POST /manuscripts/{id}/versions/{version_id}/restore - Back up, then restore
#[utoipa::path(
    post,
    path = "/manuscripts/{id}/versions/{version_id}/restore",
    tag = "Versions",
    params(
        ("id" = Uuid, Path, description = "Manuscript ID"),
        ("version_id" = Uuid, Path, description = "Version to restore")
    ),
    responses(
        (status = 200, description = "Manuscript restored; live state saved as an AUTO version", body = RestoreResult),
        (status = 404, description = "Version or manuscript not found, or insufficient permissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn restore_version(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((id, version_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<RestoreResult> {
    let result = state.versions.restore(id, version_id, &auth.user).await?;
    let message = format!(
        "Manuscript restored to version {}",
        result.restored_from_version
    );
    Ok(ApiResponse::ok(result).with_message(message))
}
