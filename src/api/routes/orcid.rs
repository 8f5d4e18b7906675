//! ORCID lookup routes.

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::OrcidProfile;
use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use utoipa::IntoParams;

pub fn orcid_router() -> Router<AppState> {
    Router::new()
        .route("/orcid/search", get(search_orcid))
        .route("/orcid/{orcid_id}", get(get_orcid_profile))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrcidSearchQuery {
    /// Free-text query
    pub q: Option<String>,
    /// Result count, clamped to 1..=50 (default 10)
    pub rows: Option<u32>,
}

/// GET /orcid/search - Search researchers on ORCID
#[utoipa::path(
    get,
    path = "/orcid/search",
    tag = "ORCID",
    params(OrcidSearchQuery),
    responses(
        (status = 200, description = "Matching researchers", body = [OrcidProfile]),
        (status = 400, description = "Bad request - empty query"),
        (status = 500, description = "ORCID unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_orcid(
    State(state): State<AppState>,
    _auth: AuthContext,
    ApiQuery(query): ApiQuery<OrcidSearchQuery>,
) -> ApiResult<Vec<OrcidProfile>> {
    let profiles = state
        .orcid
        .search(query.q.as_deref().unwrap_or_default(), query.rows)
        .await?;
    Ok(ApiResponse::ok(profiles))
}

/// GET /orcid/{orcid_id} - Fetch one researcher's public profile
#[utoipa::path(
    get,
    path = "/orcid/{orcid_id}",
    tag = "ORCID",
    params(("orcid_id" = String, Path, description = "ORCID iD, e.g. 0000-0002-1825-0097")),
    responses(
        (status = 200, description = "Researcher profile", body = OrcidProfile),
        (status = 400, description = "Bad request - malformed ORCID iD"),
        (status = 404, description = "ORCID record not found"),
        (status = 500, description = "ORCID unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_orcid_profile(
    State(state): State<AppState>,
    _auth: AuthContext,
    ApiPath(orcid_id): ApiPath<String>,
) -> ApiResult<OrcidProfile> {
    let profile = state.orcid.profile(&orcid_id).await?;
    Ok(ApiResponse::ok(profile))
}
