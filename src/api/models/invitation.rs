use super::collaborator::Collaborator;
use super::enums::{CollaboratorRole, InvitationStatus};
use super::user::User;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Invitations lapse a week after they are sent.
pub const INVITATION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub manuscript_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: Option<String>,
    pub invitee_orcid: Option<String>,
    pub invitee_name: Option<String>,
    pub role: CollaboratorRole,
    pub can_edit: bool,
    pub can_invite: bool,
    pub can_delete: bool,
    pub message: Option<String>,
    pub status: InvitationStatus,
    #[serde(skip_serializing, default)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn expiry_from(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(INVITATION_TTL_DAYS)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Matches on email (case-insensitive) or ORCID iD.
    pub fn is_addressed_to(&self, user: &User) -> bool {
        let email_match = self
            .invitee_email
            .as_deref()
            .is_some_and(|email| email.eq_ignore_ascii_case(&user.email));
        let orcid_match = match (self.invitee_orcid.as_deref(), user.orcid_id.as_deref()) {
            (Some(invited), Some(own)) => invited == own,
            _ => false,
        };
        email_match || orcid_match
    }

    /// The collaborator record created when `user_id` accepts.
    pub fn to_collaborator(&self, user_id: Uuid, now: DateTime<Utc>) -> Collaborator {
        Collaborator {
            id: Uuid::new_v4(),
            manuscript_id: self.manuscript_id,
            user_id,
            role: self.role,
            can_edit: self.can_edit,
            can_invite: self.can_invite,
            can_delete: self.can_delete,
            added_by: Some(self.inviter_id),
            created_at: now,
            updated_at: now,
        }
    }
}
