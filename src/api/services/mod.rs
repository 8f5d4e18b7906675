//! Services module - manuscript, tracked-change, version and collaboration business logic.

pub mod access_guard;
pub mod collaborator_service;
pub mod error;
pub mod invitation_service;
pub mod jwt_service;
pub mod manuscript_service;
pub mod notification_service;
pub mod orcid_service;
pub mod tracked_change_service;
mod user_lookup;
pub mod version_service;

// Re-export for convenience
pub use access_guard::{AccessGuard, ensure_can_grant, permits};
pub use collaborator_service::{CollaboratorService, UpdateCollaboratorRequest};
pub use error::ServiceError;
pub use invitation_service::{
    CreateInvitationRequest, InvitationResponse, InvitationService, RespondInvitationRequest,
};
pub use jwt_service::{Claims, JwtService, TokenError, TokenPair, TokenType};
pub use manuscript_service::{CreateManuscriptRequest, ManuscriptService, UpdateManuscriptRequest};
pub use notification_service::{MarkedRead, NotificationService, UnreadCount};
pub use orcid_service::{OrcidClient, OrcidProfile, is_valid_orcid, normalize_orcid};
pub use tracked_change_service::{ProposeChangeRequest, ResolveChangeRequest, TrackedChangeService};
pub use version_service::{CreateVersionRequest, RestoreResult, VersionService};
