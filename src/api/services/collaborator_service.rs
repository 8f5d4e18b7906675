//! Collaborator roster management.

use super::access_guard::{AccessGuard, ensure_can_grant};
use super::error::ServiceError;
use super::user_lookup::UserLookup;
use crate::models::{
    ActivityEntry, Collaborator, CollaboratorDetail, CollaboratorRole, Manuscript, Permission,
    User,
};
use crate::storage::{ActivityLog, StorageBackend};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollaboratorRequest {
    pub role: Option<String>,
    pub can_edit: Option<bool>,
    pub can_invite: Option<bool>,
    pub can_delete: Option<bool>,
}

pub struct CollaboratorService {
    storage: Arc<dyn StorageBackend>,
    guard: AccessGuard,
    activity: Arc<ActivityLog>,
}

impl CollaboratorService {
    pub fn new(storage: Arc<dyn StorageBackend>, activity: Arc<ActivityLog>) -> Self {
        Self {
            guard: AccessGuard::new(storage.clone()),
            storage,
            activity,
        }
    }

    pub async fn list(
        &self,
        manuscript_id: Uuid,
        user: &User,
    ) -> Result<Vec<CollaboratorDetail>, ServiceError> {
        self.guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;

        let collaborators = self.storage.list_collaborators(manuscript_id).await?;
        let mut users = UserLookup::new(self.storage.as_ref());
        let mut details = Vec::with_capacity(collaborators.len());
        for collaborator in collaborators {
            details.push(CollaboratorDetail {
                user: users.summary(collaborator.user_id).await?,
                collaborator,
            });
        }
        Ok(details)
    }

    pub async fn update(
        &self,
        manuscript_id: Uuid,
        collaborator_user_id: Uuid,
        user: &User,
        request: UpdateCollaboratorRequest,
    ) -> Result<CollaboratorDetail, ServiceError> {
        let manuscript = self
            .guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;
        let manager = self.require_manager(&manuscript, user.id).await?;
        if manager.is_some() && collaborator_user_id == user.id {
            return Err(ServiceError::Forbidden(
                "You cannot change your own permissions".to_string(),
            ));
        }

        let mut collaborator = self.find(manuscript_id, collaborator_user_id).await?;
        let role = request
            .role
            .as_deref()
            .map(|role| {
                role.parse::<CollaboratorRole>()
                    .map_err(|_| ServiceError::Validation(format!("Invalid role: {}", role)))
            })
            .transpose()?;
        if manager.is_some() && collaborator.role == CollaboratorRole::Owner {
            return Err(ServiceError::Forbidden(
                "Only the manuscript creator can change an owner".to_string(),
            ));
        }
        ensure_can_grant(
            manager.as_ref(),
            role,
            request.can_edit,
            request.can_invite,
            request.can_delete,
        )?;

        if let Some(role) = role {
            collaborator.role = role;
        }
        if let Some(can_edit) = request.can_edit {
            collaborator.can_edit = can_edit;
        }
        if let Some(can_invite) = request.can_invite {
            collaborator.can_invite = can_invite;
        }
        if let Some(can_delete) = request.can_delete {
            collaborator.can_delete = can_delete;
        }
        collaborator.updated_at = Utc::now();

        let collaborator = self.storage.update_collaborator(collaborator).await?;

        info!(
            manuscript_id = %manuscript_id,
            collaborator = %collaborator_user_id,
            role = %collaborator.role,
            "Collaborator updated"
        );
        self.activity
            .record(
                ActivityEntry::new(user.id, "collaborator.updated", "collaborator", collaborator.id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({
                        "userId": collaborator_user_id,
                        "role": collaborator.role,
                        "canEdit": collaborator.can_edit,
                        "canInvite": collaborator.can_invite,
                        "canDelete": collaborator.can_delete,
                    })),
            )
            .await;

        let mut users = UserLookup::new(self.storage.as_ref());
        Ok(CollaboratorDetail {
            user: users.summary(collaborator.user_id).await?,
            collaborator,
        })
    }

    /// Managers may remove anyone but the creator; a collaborator may always leave.
    pub async fn remove(
        &self,
        manuscript_id: Uuid,
        collaborator_user_id: Uuid,
        user: &User,
    ) -> Result<(), ServiceError> {
        let manuscript = self
            .guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;
        if manuscript.is_creator(collaborator_user_id) {
            return Err(ServiceError::Validation(
                "The manuscript owner cannot be removed".to_string(),
            ));
        }
        let manager = if collaborator_user_id != user.id {
            self.require_manager(&manuscript, user.id).await?
        } else {
            None
        };

        let collaborator = self.find(manuscript_id, collaborator_user_id).await?;
        if manager.is_some() && collaborator.role == CollaboratorRole::Owner {
            return Err(ServiceError::Forbidden(
                "Only the manuscript creator can change an owner".to_string(),
            ));
        }
        self.storage
            .remove_collaborator(manuscript_id, collaborator_user_id)
            .await?;

        info!(
            manuscript_id = %manuscript_id,
            collaborator = %collaborator_user_id,
            removed_by = %user.id,
            "Collaborator removed"
        );
        self.activity
            .record(
                ActivityEntry::new(user.id, "collaborator.removed", "collaborator", collaborator.id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({ "userId": collaborator_user_id })),
            )
            .await;
        Ok(())
    }

    async fn find(
        &self,
        manuscript_id: Uuid,
        collaborator_user_id: Uuid,
    ) -> Result<Collaborator, ServiceError> {
        self.storage
            .get_collaborator(manuscript_id, collaborator_user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Collaborator not found".to_string()))
    }

    /// The caller's own record when they manage through a role, `None` for the creator.
    async fn require_manager(
        &self,
        manuscript: &Manuscript,
        user_id: Uuid,
    ) -> Result<Option<Collaborator>, ServiceError> {
        if manuscript.is_creator(user_id) {
            return Ok(None);
        }
        match self.storage.get_collaborator(manuscript.id, user_id).await? {
            Some(c) if c.role.can_manage_collaborators() => Ok(Some(c)),
            _ => Err(ServiceError::Forbidden(
                "Only the owner or an admin can manage collaborators".to_string(),
            )),
        }
    }
}
