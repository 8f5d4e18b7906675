//! OpenAPI specification definition.
//!
//! Aggregates all route handlers and schemas for OpenAPI documentation generation.

use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Authentication
        crate::routes::auth::refresh_token,
        crate::routes::auth::get_current_user,
        // Manuscripts
        crate::routes::manuscripts::list_manuscripts,
        crate::routes::manuscripts::create_manuscript,
        crate::routes::manuscripts::get_manuscript,
        crate::routes::manuscripts::update_manuscript,
        crate::routes::manuscripts::delete_manuscript,
        crate::routes::manuscripts::get_activity,
        // Tracked changes
        crate::routes::changes::list_changes,
        crate::routes::changes::propose_change,
        crate::routes::changes::resolve_change,
        crate::routes::changes::delete_change,
        // Versions
        crate::routes::versions::list_versions,
        crate::routes::versions::create_version,
        crate::routes::versions::get_version,
        crate::routes::versions::restore_version,
        // Collaborators
        crate::routes::collaborators::list_collaborators,
        crate::routes::collaborators::update_collaborator,
        crate::routes::collaborators::remove_collaborator,
        // Invitations
        crate::routes::invitations::list_manuscript_invitations,
        crate::routes::invitations::create_invitation,
        crate::routes::invitations::list_my_invitations,
        crate::routes::invitations::respond_to_invitation,
        // Notifications
        crate::routes::notifications::list_notifications,
        crate::routes::notifications::unread_count,
        crate::routes::notifications::mark_read,
        crate::routes::notifications::mark_all_read,
        // ORCID
        crate::routes::orcid::search_orcid,
        crate::routes::orcid::get_orcid_profile,
        // OpenAPI
        crate::routes::openapi::serve_openapi_json,
    ),
    components(
        schemas(
            crate::models::User,
            crate::models::UserSummary,
            crate::models::Manuscript,
            crate::models::ManuscriptStatus,
            crate::models::TrackedChange,
            crate::models::TrackedChangeDetail,
            crate::models::ChangeStatus,
            crate::models::ManuscriptVersion,
            crate::models::VersionSummary,
            crate::models::VersionType,
            crate::models::Collaborator,
            crate::models::CollaboratorDetail,
            crate::models::CollaboratorRole,
            crate::models::Invitation,
            crate::models::InvitationStatus,
            crate::models::Notification,
            crate::models::NotificationType,
            crate::models::ActivityEntry,
            crate::services::CreateManuscriptRequest,
            crate::services::UpdateManuscriptRequest,
            crate::services::ProposeChangeRequest,
            crate::services::ResolveChangeRequest,
            crate::services::CreateVersionRequest,
            crate::services::RestoreResult,
            crate::services::UpdateCollaboratorRequest,
            crate::services::CreateInvitationRequest,
            crate::services::RespondInvitationRequest,
            crate::services::InvitationResponse,
            crate::services::UnreadCount,
            crate::services::MarkedRead,
            crate::services::OrcidProfile,
            crate::services::TokenPair,
            crate::routes::auth::RefreshTokenRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Token refresh and caller identity"),
        (name = "Manuscripts", description = "Manuscript CRUD and activity"),
        (name = "Tracked Changes", description = "Propose, resolve and remove tracked changes"),
        (name = "Versions", description = "Version snapshots and restore"),
        (name = "Collaborators", description = "Collaborator roster management"),
        (name = "Invitations", description = "Invite collaborators by email or ORCID iD"),
        (name = "Notifications", description = "Per-user notification inbox"),
        (name = "ORCID", description = "ORCID researcher lookup"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    info(
        title = "Manuscript Collaboration API",
        description = "Manuscript authoring with tracked changes, version snapshots, invitations and notifications",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8081/api/v1", description = "Local development server")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();

        use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
        openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new)
            .add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
    }
}
