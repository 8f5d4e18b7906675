//! In-memory storage backend implementation.
//!
//! Used when no `DATABASE_URL` is configured and by the test suite. A single
//! write lock covers every multi-step operation, which gives the same
//! all-or-nothing behaviour the PostgreSQL backend gets from transactions.

use super::{StorageError, traits::*};
use crate::models::{
    ChangeStatus, Collaborator, Invitation, InvitationStatus, Manuscript, ManuscriptVersion,
    NewVersion, Notification, TrackedChange, User, VersionType,
};
use crate::text::count_words;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryData {
    users: HashMap<Uuid, User>,
    manuscripts: HashMap<Uuid, Manuscript>,
    collaborators: Vec<Collaborator>,
    changes: Vec<TrackedChange>,
    versions: Vec<ManuscriptVersion>,
    invitations: Vec<Invitation>,
    notifications: Vec<Notification>,
}

impl MemoryData {
    fn next_version_number(&self, manuscript_id: Uuid) -> i32 {
        self.versions
            .iter()
            .filter(|v| v.manuscript_id == manuscript_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn insert_collaborator(&mut self, collaborator: Collaborator) -> Result<Collaborator, StorageError> {
        let exists = self.collaborators.iter().any(|c| {
            c.manuscript_id == collaborator.manuscript_id && c.user_id == collaborator.user_id
        });
        if exists {
            return Err(StorageError::Conflict(format!(
                "user {} already collaborates on manuscript {}",
                collaborator.user_id, collaborator.manuscript_id
            )));
        }
        self.collaborators.push(collaborator.clone());
        Ok(collaborator)
    }
}

/// Newest first; ties keep the most recently inserted record in front.
fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.reverse();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStorageBackend {
    data: RwLock<MemoryData>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorageBackend {
    async fn create_user(&self, user: User) -> Result<User, StorageError> {
        let mut data = self.data.write().await;
        if data
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StorageError::Conflict(format!(
                "user with email {} already exists",
                user.email
            )));
        }
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StorageError> {
        Ok(self.data.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_orcid(&self, orcid_id: &str) -> Result<Option<User>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .find(|u| u.orcid_id.as_deref() == Some(orcid_id))
            .cloned())
    }

    async fn create_manuscript(&self, manuscript: Manuscript) -> Result<Manuscript, StorageError> {
        let mut data = self.data.write().await;
        data.manuscripts.insert(manuscript.id, manuscript.clone());
        Ok(manuscript)
    }

    async fn get_manuscript(&self, manuscript_id: Uuid) -> Result<Option<Manuscript>, StorageError> {
        Ok(self.data.read().await.manuscripts.get(&manuscript_id).cloned())
    }

    async fn list_manuscripts_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Manuscript>, StorageError> {
        let data = self.data.read().await;
        let mut manuscripts: Vec<Manuscript> = data
            .manuscripts
            .values()
            .filter(|m| {
                m.created_by == user_id
                    || data
                        .collaborators
                        .iter()
                        .any(|c| c.manuscript_id == m.id && c.user_id == user_id)
            })
            .cloned()
            .collect();
        manuscripts.sort_by_key(|m| std::cmp::Reverse(m.updated_at));
        Ok(manuscripts)
    }

    async fn update_manuscript(&self, manuscript: Manuscript) -> Result<Manuscript, StorageError> {
        let mut data = self.data.write().await;
        match data.manuscripts.get_mut(&manuscript.id) {
            Some(existing) => {
                *existing = manuscript.clone();
                Ok(manuscript)
            }
            None => Err(StorageError::not_found("manuscript", manuscript.id)),
        }
    }

    async fn delete_manuscript(&self, manuscript_id: Uuid) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        if data.manuscripts.remove(&manuscript_id).is_none() {
            return Err(StorageError::not_found("manuscript", manuscript_id));
        }
        data.collaborators.retain(|c| c.manuscript_id != manuscript_id);
        data.changes.retain(|c| c.manuscript_id != manuscript_id);
        data.versions.retain(|v| v.manuscript_id != manuscript_id);
        data.invitations.retain(|i| i.manuscript_id != manuscript_id);
        for notification in data.notifications.iter_mut() {
            if notification.manuscript_id == Some(manuscript_id) {
                notification.manuscript_id = None;
            }
        }
        Ok(())
    }

    async fn get_collaborator(
        &self,
        manuscript_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Collaborator>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .collaborators
            .iter()
            .find(|c| c.manuscript_id == manuscript_id && c.user_id == user_id)
            .cloned())
    }

    async fn list_collaborators(
        &self,
        manuscript_id: Uuid,
    ) -> Result<Vec<Collaborator>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .collaborators
            .iter()
            .filter(|c| c.manuscript_id == manuscript_id)
            .cloned()
            .collect())
    }

    async fn add_collaborator(
        &self,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError> {
        self.data.write().await.insert_collaborator(collaborator)
    }

    async fn update_collaborator(
        &self,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError> {
        let mut data = self.data.write().await;
        let existing = data
            .collaborators
            .iter_mut()
            .find(|c| {
                c.manuscript_id == collaborator.manuscript_id && c.user_id == collaborator.user_id
            })
            .ok_or_else(|| StorageError::not_found("collaborator", collaborator.user_id))?;
        *existing = collaborator.clone();
        Ok(collaborator)
    }

    async fn remove_collaborator(
        &self,
        manuscript_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        let before = data.collaborators.len();
        data.collaborators
            .retain(|c| !(c.manuscript_id == manuscript_id && c.user_id == user_id));
        if data.collaborators.len() == before {
            return Err(StorageError::not_found("collaborator", user_id));
        }
        Ok(())
    }

    async fn create_change(&self, change: TrackedChange) -> Result<TrackedChange, StorageError> {
        let mut data = self.data.write().await;
        if !data.manuscripts.contains_key(&change.manuscript_id) {
            return Err(StorageError::not_found("manuscript", change.manuscript_id));
        }
        data.changes.push(change.clone());
        Ok(change)
    }

    async fn get_change(
        &self,
        manuscript_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TrackedChange>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .changes
            .iter()
            .find(|c| c.manuscript_id == manuscript_id && c.id == id)
            .cloned())
    }

    async fn find_change_by_client_id(
        &self,
        manuscript_id: Uuid,
        change_id: &str,
    ) -> Result<Option<TrackedChange>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .changes
            .iter()
            .rev()
            .find(|c| c.manuscript_id == manuscript_id && c.change_id == change_id)
            .cloned())
    }

    async fn list_changes(&self, manuscript_id: Uuid) -> Result<Vec<TrackedChange>, StorageError> {
        let data = self.data.read().await;
        let changes = data
            .changes
            .iter()
            .filter(|c| c.manuscript_id == manuscript_id)
            .cloned()
            .collect();
        Ok(newest_first(changes, |c| c.created_at))
    }

    async fn resolve_change(
        &self,
        manuscript_id: Uuid,
        id: Uuid,
        status: ChangeStatus,
        resolved_by: Uuid,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<TrackedChange>, StorageError> {
        let mut data = self.data.write().await;
        let change = data
            .changes
            .iter_mut()
            .find(|c| c.manuscript_id == manuscript_id && c.id == id)
            .ok_or_else(|| StorageError::not_found("tracked_change", id))?;
        if !change.is_pending() {
            return Ok(None);
        }
        change.resolve(status, resolved_by, resolved_at);
        Ok(Some(change.clone()))
    }

    async fn delete_change(&self, manuscript_id: Uuid, id: Uuid) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        let before = data.changes.len();
        data.changes
            .retain(|c| !(c.manuscript_id == manuscript_id && c.id == id));
        if data.changes.len() == before {
            return Err(StorageError::not_found("tracked_change", id));
        }
        Ok(())
    }

    async fn create_version(&self, version: NewVersion) -> Result<ManuscriptVersion, StorageError> {
        let mut data = self.data.write().await;
        if !data.manuscripts.contains_key(&version.manuscript_id) {
            return Err(StorageError::not_found("manuscript", version.manuscript_id));
        }
        let number = data.next_version_number(version.manuscript_id);
        let version = version.into_version(number, Utc::now());
        data.versions.push(version.clone());
        Ok(version)
    }

    async fn get_version(
        &self,
        manuscript_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<ManuscriptVersion>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .versions
            .iter()
            .find(|v| v.manuscript_id == manuscript_id && v.id == version_id)
            .cloned())
    }

    async fn list_versions(
        &self,
        manuscript_id: Uuid,
    ) -> Result<Vec<ManuscriptVersion>, StorageError> {
        let data = self.data.read().await;
        let mut versions: Vec<ManuscriptVersion> = data
            .versions
            .iter()
            .filter(|v| v.manuscript_id == manuscript_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| std::cmp::Reverse(v.version_number));
        Ok(versions)
    }

    async fn restore_version(
        &self,
        target: &ManuscriptVersion,
        restored_by: Uuid,
        backup_description: String,
    ) -> Result<RestoreOutcome, StorageError> {
        let mut data = self.data.write().await;
        let live = data
            .manuscripts
            .get(&target.manuscript_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("manuscript", target.manuscript_id))?;

        let now = Utc::now();
        let number = data.next_version_number(live.id);
        let backup = NewVersion {
            manuscript_id: live.id,
            word_count: count_words(&live.content),
            title: live.title.clone(),
            content: live.content.clone(),
            changes: None,
            created_by: restored_by,
            version_type: VersionType::Auto,
            description: Some(backup_description),
        }
        .into_version(number, now);

        let mut restored = live;
        restored.title = target.title.clone();
        restored.content = target.content.clone();
        restored.word_count = target.word_count;
        restored.updated_at = now;

        data.versions.push(backup.clone());
        data.manuscripts.insert(restored.id, restored.clone());

        Ok(RestoreOutcome {
            manuscript: restored,
            backup,
        })
    }

    async fn create_invitation(&self, invitation: Invitation) -> Result<Invitation, StorageError> {
        let mut data = self.data.write().await;
        if !data.manuscripts.contains_key(&invitation.manuscript_id) {
            return Err(StorageError::not_found("manuscript", invitation.manuscript_id));
        }
        data.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .invitations
            .iter()
            .find(|i| i.id == invitation_id)
            .cloned())
    }

    async fn list_invitations_for_manuscript(
        &self,
        manuscript_id: Uuid,
    ) -> Result<Vec<Invitation>, StorageError> {
        let data = self.data.read().await;
        let invitations = data
            .invitations
            .iter()
            .filter(|i| i.manuscript_id == manuscript_id)
            .cloned()
            .collect();
        Ok(newest_first(invitations, |i| i.created_at))
    }

    async fn list_pending_invitations_for(
        &self,
        email: &str,
        orcid_id: Option<&str>,
    ) -> Result<Vec<Invitation>, StorageError> {
        let data = self.data.read().await;
        let invitations = data
            .invitations
            .iter()
            .filter(|i| i.status == InvitationStatus::Pending)
            .filter(|i| {
                i.invitee_email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
                    || (orcid_id.is_some() && i.invitee_orcid.as_deref() == orcid_id)
            })
            .cloned()
            .collect();
        Ok(newest_first(invitations, |i| i.created_at))
    }

    async fn set_invitation_status(
        &self,
        invitation_id: Uuid,
        status: InvitationStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> Result<Invitation, StorageError> {
        let mut data = self.data.write().await;
        let invitation = data
            .invitations
            .iter_mut()
            .find(|i| i.id == invitation_id)
            .ok_or_else(|| StorageError::not_found("invitation", invitation_id))?;
        invitation.status = status;
        invitation.responded_at = responded_at;
        Ok(invitation.clone())
    }

    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError> {
        let mut data = self.data.write().await;
        let pending = data
            .invitations
            .iter()
            .find(|i| i.id == invitation_id)
            .map(|i| i.status == InvitationStatus::Pending)
            .ok_or_else(|| StorageError::not_found("invitation", invitation_id))?;
        if !pending {
            return Err(StorageError::Conflict(format!(
                "invitation {} is no longer pending",
                invitation_id
            )));
        }

        let collaborator = data.insert_collaborator(collaborator)?;
        if let Some(invitation) = data.invitations.iter_mut().find(|i| i.id == invitation_id) {
            invitation.status = InvitationStatus::Accepted;
            invitation.responded_at = Some(collaborator.created_at);
        }
        Ok(collaborator)
    }

    async fn create_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, StorageError> {
        self.data.write().await.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, StorageError> {
        let data = self.data.read().await;
        let notifications = data
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        let mut notifications = newest_first(notifications, |n| n.created_at);
        notifications.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(notifications)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StorageError> {
        let data = self.data.read().await;
        let count = data
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, StorageError> {
        let mut data = self.data.write().await;
        match data
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, StorageError> {
        let mut data = self.data.write().await;
        let mut updated = 0;
        for notification in data
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            notification.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}
