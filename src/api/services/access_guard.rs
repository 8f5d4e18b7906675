//! Authorization predicate shared by every manuscript-scoped operation.

use super::error::ServiceError;
use crate::models::{Collaborator, CollaboratorRole, Manuscript, Permission};
use crate::storage::{StorageBackend, StorageError};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Whether `user_id` holds `permission` on `manuscript`.
///
/// The creator holds every permission. Any collaborator may view; edit,
/// delete and invite need the matching flag on the collaborator record.
pub fn permits(
    manuscript: &Manuscript,
    collaborator: Option<&Collaborator>,
    user_id: Uuid,
    permission: Permission,
) -> bool {
    if manuscript.is_creator(user_id) {
        return true;
    }
    collaborator.is_some_and(|c| {
        c.manuscript_id == manuscript.id && c.user_id == user_id && c.grants(permission)
    })
}

/// Check that a granter may hand out `role` and any flag set to `true`.
///
/// `granter` is `None` for the manuscript creator, who may grant anything.
/// Everyone else may not assign OWNER and may only grant flags they hold.
pub fn ensure_can_grant(
    granter: Option<&Collaborator>,
    role: Option<CollaboratorRole>,
    can_edit: Option<bool>,
    can_invite: Option<bool>,
    can_delete: Option<bool>,
) -> Result<(), ServiceError> {
    let Some(granter) = granter else {
        return Ok(());
    };
    if role == Some(CollaboratorRole::Owner) {
        return Err(ServiceError::Forbidden(
            "Only the manuscript creator can assign the OWNER role".to_string(),
        ));
    }
    for (requested, held, name) in [
        (can_edit, granter.can_edit, "canEdit"),
        (can_invite, granter.can_invite, "canInvite"),
        (can_delete, granter.can_delete, "canDelete"),
    ] {
        if requested == Some(true) && !held {
            return Err(ServiceError::Forbidden(format!(
                "Cannot grant {} without holding it",
                name
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccessGuard {
    storage: Arc<dyn StorageBackend>,
}

impl AccessGuard {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn can_access(
        &self,
        user_id: Uuid,
        manuscript_id: Uuid,
        permission: Permission,
    ) -> Result<bool, StorageError> {
        Ok(self
            .authorized_manuscript(user_id, manuscript_id, permission)
            .await?
            .is_some())
    }

    /// Load the manuscript if the user holds `permission`, otherwise `NotFoundOrForbidden`.
    pub async fn require(
        &self,
        user_id: Uuid,
        manuscript_id: Uuid,
        permission: Permission,
    ) -> Result<Manuscript, ServiceError> {
        match self
            .authorized_manuscript(user_id, manuscript_id, permission)
            .await?
        {
            Some(manuscript) => Ok(manuscript),
            None => {
                warn!(
                    user_id = %user_id,
                    manuscript_id = %manuscript_id,
                    permission = %permission,
                    "Manuscript access denied"
                );
                Err(ServiceError::NotFoundOrForbidden("Manuscript"))
            }
        }
    }

    async fn authorized_manuscript(
        &self,
        user_id: Uuid,
        manuscript_id: Uuid,
        permission: Permission,
    ) -> Result<Option<Manuscript>, StorageError> {
        let Some(manuscript) = self.storage.get_manuscript(manuscript_id).await? else {
            return Ok(None);
        };
        if manuscript.is_creator(user_id) {
            return Ok(Some(manuscript));
        }
        let collaborator = self.storage.get_collaborator(manuscript_id, user_id).await?;
        Ok(permits(&manuscript, collaborator.as_ref(), user_id, permission).then_some(manuscript))
    }
}
