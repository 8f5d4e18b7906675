use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Raised when a stored or submitted string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a SCREAMING_SNAKE_CASE string enum with `as_str`, `Display` and `FromStr`.
///
/// Values are persisted as TEXT columns, so the string form must stay stable.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Editorial state of a manuscript.
    ManuscriptStatus {
        Draft => "DRAFT",
        InReview => "IN_REVIEW",
        Submitted => "SUBMITTED",
        Published => "PUBLISHED",
        Archived => "ARCHIVED",
    }
}

string_enum! {
    /// Lifecycle of a tracked change. PENDING transitions once.
    ChangeStatus {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
    }
}

string_enum! {
    /// How a version snapshot came to exist.
    VersionType {
        /// Created explicitly by a collaborator
        Manual => "MANUAL",
        /// Created implicitly, e.g. as a pre-restore backup
        Auto => "AUTO",
    }
}

string_enum! {
    CollaboratorRole {
        Owner => "OWNER",
        Admin => "ADMIN",
        Editor => "EDITOR",
        Contributor => "CONTRIBUTOR",
        Reviewer => "REVIEWER",
        Viewer => "VIEWER",
    }
}

string_enum! {
    InvitationStatus {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Declined => "DECLINED",
        Expired => "EXPIRED",
    }
}

string_enum! {
    NotificationType {
        Invitation => "INVITATION",
        ChangeProposed => "CHANGE_PROPOSED",
        ChangeResolved => "CHANGE_RESOLVED",
        VersionCreated => "VERSION_CREATED",
        VersionRestored => "VERSION_RESTORED",
        CollaboratorAdded => "COLLABORATOR_ADDED",
    }
}

string_enum! {
    /// Permission checked by the access guard.
    Permission {
        View => "VIEW",
        Edit => "EDIT",
        Delete => "DELETE",
        Invite => "INVITE",
    }
}

impl Default for ManuscriptStatus {
    fn default() -> Self {
        ManuscriptStatus::Draft
    }
}

impl Default for VersionType {
    fn default() -> Self {
        VersionType::Manual
    }
}

/// Permission flags a role carries unless the inviter overrides them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGrants {
    pub can_edit: bool,
    pub can_invite: bool,
    pub can_delete: bool,
}

impl CollaboratorRole {
    /// Roles allowed to manage other collaborators' permissions.
    pub fn can_manage_collaborators(&self) -> bool {
        matches!(self, CollaboratorRole::Owner | CollaboratorRole::Admin)
    }

    pub fn default_grants(&self) -> RoleGrants {
        let (can_edit, can_invite, can_delete) = match self {
            CollaboratorRole::Owner => (true, true, true),
            CollaboratorRole::Admin => (true, true, false),
            CollaboratorRole::Editor | CollaboratorRole::Contributor => (true, false, false),
            CollaboratorRole::Reviewer | CollaboratorRole::Viewer => (false, false, false),
        };
        RoleGrants {
            can_edit,
            can_invite,
            can_delete,
        }
    }
}
