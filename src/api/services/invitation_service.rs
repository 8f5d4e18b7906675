//! Collaborator invitations by email or ORCID iD.

use super::access_guard::{AccessGuard, ensure_can_grant};
use super::error::ServiceError;
use super::notification_service::NotificationService;
use super::orcid_service::{is_valid_orcid, normalize_orcid};
use crate::models::{
    ActivityEntry, Collaborator, CollaboratorRole, Invitation, InvitationStatus, Notification,
    NotificationType, Permission, User,
};
use crate::storage::{ActivityLog, StorageBackend};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationRequest {
    pub email: Option<String>,
    pub orcid_id: Option<String>,
    pub name: Option<String>,
    /// Defaults to CONTRIBUTOR
    pub role: Option<String>,
    pub can_edit: Option<bool>,
    pub can_invite: Option<bool>,
    pub can_delete: Option<bool>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondInvitationRequest {
    pub accept: Option<bool>,
}

/// What happened to an invitation the caller responded to.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub invitation: Invitation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborator: Option<Collaborator>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct InvitationService {
    storage: Arc<dyn StorageBackend>,
    guard: AccessGuard,
    notifications: NotificationService,
    activity: Arc<ActivityLog>,
}

impl InvitationService {
    pub fn new(storage: Arc<dyn StorageBackend>, activity: Arc<ActivityLog>) -> Self {
        Self {
            guard: AccessGuard::new(storage.clone()),
            notifications: NotificationService::new(storage.clone()),
            storage,
            activity,
        }
    }

    pub async fn invite(
        &self,
        manuscript_id: Uuid,
        inviter: &User,
        request: CreateInvitationRequest,
    ) -> Result<Invitation, ServiceError> {
        let manuscript = self
            .guard
            .require(inviter.id, manuscript_id, Permission::Invite)
            .await?;

        let email = non_blank(request.email).map(|e| e.to_lowercase());
        let orcid = non_blank(request.orcid_id).map(|o| normalize_orcid(&o));
        if email.is_none() && orcid.is_none() {
            return Err(ServiceError::Validation(
                "Either email or orcidId is required".to_string(),
            ));
        }
        if let Some(email) = email.as_deref() {
            if !email.contains('@') {
                return Err(ServiceError::Validation(format!("Invalid email: {}", email)));
            }
        }
        if let Some(orcid) = orcid.as_deref() {
            if !is_valid_orcid(orcid) {
                return Err(ServiceError::Validation(format!("Invalid ORCID iD: {}", orcid)));
            }
        }

        let role = match request.role.as_deref() {
            Some(raw) => raw
                .parse::<CollaboratorRole>()
                .map_err(|_| ServiceError::Validation(format!("Invalid role: {}", raw)))?,
            None => CollaboratorRole::Contributor,
        };
        let inviter_record = if manuscript.is_creator(inviter.id) {
            None
        } else {
            let record = self.storage.get_collaborator(manuscript_id, inviter.id).await?;
            Some(record.ok_or(ServiceError::NotFoundOrForbidden("Manuscript"))?)
        };
        ensure_can_grant(
            inviter_record.as_ref(),
            Some(role),
            request.can_edit,
            request.can_invite,
            request.can_delete,
        )?;
        let mut grants = role.default_grants();
        if let Some(own) = inviter_record.as_ref() {
            grants.can_edit &= own.can_edit;
            grants.can_invite &= own.can_invite;
            grants.can_delete &= own.can_delete;
        }

        let invitee = self.find_invitee(email.as_deref(), orcid.as_deref()).await?;
        if let Some(invitee) = invitee.as_ref() {
            let collaborating = manuscript.is_creator(invitee.id)
                || self
                    .storage
                    .get_collaborator(manuscript_id, invitee.id)
                    .await?
                    .is_some();
            if collaborating {
                return Err(ServiceError::Validation(
                    "User is already a collaborator on this manuscript".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let duplicate = self
            .storage
            .list_invitations_for_manuscript(manuscript_id)
            .await?
            .into_iter()
            .any(|existing| {
                existing.status == InvitationStatus::Pending
                    && !existing.is_expired(now)
                    && ((email.is_some() && existing.invitee_email == email)
                        || (orcid.is_some() && existing.invitee_orcid == orcid))
            });
        if duplicate {
            return Err(ServiceError::Validation(
                "A pending invitation already exists for this invitee".to_string(),
            ));
        }

        let invitation = self
            .storage
            .create_invitation(Invitation {
                id: Uuid::new_v4(),
                manuscript_id,
                inviter_id: inviter.id,
                invitee_email: email,
                invitee_orcid: orcid,
                invitee_name: non_blank(request.name),
                role,
                can_edit: request.can_edit.unwrap_or(grants.can_edit),
                can_invite: request.can_invite.unwrap_or(grants.can_invite),
                can_delete: request.can_delete.unwrap_or(grants.can_delete),
                message: non_blank(request.message),
                status: InvitationStatus::Pending,
                token: Uuid::new_v4().simple().to_string(),
                expires_at: Invitation::expiry_from(now),
                created_at: now,
                responded_at: None,
            })
            .await?;

        info!(
            manuscript_id = %manuscript_id,
            invitation_id = %invitation.id,
            role = %invitation.role,
            "Invitation sent"
        );
        self.activity
            .record(
                ActivityEntry::new(inviter.id, "invitation.sent", "invitation", invitation.id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({
                        "email": invitation.invitee_email,
                        "orcidId": invitation.invitee_orcid,
                        "role": invitation.role,
                    })),
            )
            .await;

        if let Some(invitee) = invitee {
            self.notifications
                .send(Notification::new(
                    invitee.id,
                    NotificationType::Invitation,
                    "Collaboration invitation",
                    format!(
                        "{} invited you to collaborate on \"{}\"",
                        inviter.name, manuscript.title
                    ),
                    Some(manuscript_id),
                ))
                .await;
        }

        Ok(invitation)
    }

    pub async fn list_for_manuscript(
        &self,
        manuscript_id: Uuid,
        user: &User,
    ) -> Result<Vec<Invitation>, ServiceError> {
        self.guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;
        Ok(self
            .storage
            .list_invitations_for_manuscript(manuscript_id)
            .await?)
    }

    /// Pending, unexpired invitations addressed to the caller.
    pub async fn list_mine(&self, user: &User) -> Result<Vec<Invitation>, ServiceError> {
        let now = Utc::now();
        let invitations = self
            .storage
            .list_pending_invitations_for(&user.email, user.orcid_id.as_deref())
            .await?;
        Ok(invitations
            .into_iter()
            .filter(|i| !i.is_expired(now))
            .collect())
    }

    pub async fn respond(
        &self,
        invitation_id: Uuid,
        user: &User,
        request: RespondInvitationRequest,
    ) -> Result<InvitationResponse, ServiceError> {
        let accept = request
            .accept
            .ok_or_else(|| ServiceError::missing_field("accept"))?;
        let invitation = self
            .storage
            .get_invitation(invitation_id)
            .await?
            .filter(|i| i.is_addressed_to(user))
            .ok_or_else(|| ServiceError::NotFound("Invitation not found".to_string()))?;

        if invitation.status != InvitationStatus::Pending {
            return Err(ServiceError::Validation(format!(
                "Invitation has already been {}",
                invitation.status.as_str().to_lowercase()
            )));
        }

        let now = Utc::now();
        if invitation.is_expired(now) {
            self.storage
                .set_invitation_status(invitation_id, InvitationStatus::Expired, None)
                .await?;
            return Err(ServiceError::Validation("Invitation has expired".to_string()));
        }

        let (invitation, collaborator) = if accept {
            let collaborator = self
                .storage
                .accept_invitation(invitation_id, invitation.to_collaborator(user.id, now))
                .await
                .map_err(ServiceError::from_conflict)?;
            let invitation = self
                .storage
                .get_invitation(invitation_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Invitation not found".to_string()))?;
            (invitation, Some(collaborator))
        } else {
            let invitation = self
                .storage
                .set_invitation_status(invitation_id, InvitationStatus::Declined, Some(now))
                .await?;
            (invitation, None)
        };

        let action = if accept {
            "invitation.accepted"
        } else {
            "invitation.declined"
        };
        info!(
            invitation_id = %invitation_id,
            manuscript_id = %invitation.manuscript_id,
            user_id = %user.id,
            accepted = accept,
            "Invitation answered"
        );
        self.activity
            .record(
                ActivityEntry::new(user.id, action, "invitation", invitation_id)
                    .for_manuscript(invitation.manuscript_id),
            )
            .await;

        let manuscript_title = self
            .storage
            .get_manuscript(invitation.manuscript_id)
            .await?
            .map(|m| m.title)
            .unwrap_or_default();
        let (notification_type, verb) = if accept {
            (NotificationType::CollaboratorAdded, "accepted")
        } else {
            (NotificationType::Invitation, "declined")
        };
        self.notifications
            .send(Notification::new(
                invitation.inviter_id,
                notification_type,
                format!("Invitation {}", verb),
                format!(
                    "{} {} your invitation to \"{}\"",
                    user.name, verb, manuscript_title
                ),
                Some(invitation.manuscript_id),
            ))
            .await;

        Ok(InvitationResponse {
            invitation,
            collaborator,
        })
    }

    async fn find_invitee(
        &self,
        email: Option<&str>,
        orcid: Option<&str>,
    ) -> Result<Option<User>, ServiceError> {
        if let Some(email) = email {
            if let Some(user) = self.storage.find_user_by_email(email).await? {
                return Ok(Some(user));
            }
        }
        if let Some(orcid) = orcid {
            return Ok(self.storage.find_user_by_orcid(orcid).await?);
        }
        Ok(None)
    }
}
