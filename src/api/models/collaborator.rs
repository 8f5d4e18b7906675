use super::enums::{CollaboratorRole, Permission};
use super::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A user granted a permission subset on a manuscript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: Uuid,
    pub manuscript_id: Uuid,
    pub user_id: Uuid,
    pub role: CollaboratorRole,
    pub can_edit: bool,
    pub can_invite: bool,
    pub can_delete: bool,
    pub added_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collaborator {
    /// Whether this record alone grants `permission`. Any collaborator may view.
    pub fn grants(&self, permission: Permission) -> bool {
        match permission {
            Permission::View => true,
            Permission::Edit => self.can_edit,
            Permission::Delete => self.can_delete,
            Permission::Invite => self.can_invite,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorDetail {
    #[serde(flatten)]
    pub collaborator: Collaborator,
    pub user: Option<UserSummary>,
}
