// Models module - manuscripts, tracked changes, versions, collaboration records and enums

pub mod activity;
pub mod collaborator;
pub mod enums;
pub mod invitation;
pub mod manuscript;
pub mod notification;
pub mod tracked_change;
pub mod user;
pub mod version;

pub use activity::ActivityEntry;
pub use collaborator::{Collaborator, CollaboratorDetail};
pub use enums::{
    ChangeStatus, CollaboratorRole, InvitationStatus, ManuscriptStatus, NotificationType,
    ParseEnumError, Permission, RoleGrants, VersionType,
};
pub use invitation::Invitation;
pub use manuscript::Manuscript;
pub use notification::Notification;
pub use tracked_change::{TrackedChange, TrackedChangeDetail};
pub use user::{User, UserSummary};
pub use version::{ManuscriptVersion, NewVersion, VersionSummary, backup_description};
