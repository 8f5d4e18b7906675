//! Storage trait definitions for the API storage backends.

use super::StorageError;
use crate::models::{
    ChangeStatus, Collaborator, Invitation, InvitationStatus, Manuscript, ManuscriptVersion,
    NewVersion, Notification, TrackedChange, User,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Outcome of an atomic backup-then-restore.
#[derive(Clone, Debug)]
pub struct RestoreOutcome {
    /// The live manuscript after the overwrite
    pub manuscript: Manuscript,
    /// The AUTO snapshot of the pre-restore state
    pub backup: ManuscriptVersion,
}

/// Storage backend trait for database operations
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    // Users

    async fn create_user(&self, user: User) -> Result<User, StorageError>;

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StorageError>;

    /// Case-insensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    async fn find_user_by_orcid(&self, orcid_id: &str) -> Result<Option<User>, StorageError>;

    // Manuscripts

    async fn create_manuscript(&self, manuscript: Manuscript) -> Result<Manuscript, StorageError>;

    async fn get_manuscript(&self, manuscript_id: Uuid) -> Result<Option<Manuscript>, StorageError>;

    /// Manuscripts the user created or collaborates on, most recently updated first
    async fn list_manuscripts_for_user(&self, user_id: Uuid)
    -> Result<Vec<Manuscript>, StorageError>;

    async fn update_manuscript(&self, manuscript: Manuscript) -> Result<Manuscript, StorageError>;

    /// Delete a manuscript along with its changes, versions, collaborators and invitations
    async fn delete_manuscript(&self, manuscript_id: Uuid) -> Result<(), StorageError>;

    // Collaborators

    async fn get_collaborator(
        &self,
        manuscript_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Collaborator>, StorageError>;

    async fn list_collaborators(&self, manuscript_id: Uuid)
    -> Result<Vec<Collaborator>, StorageError>;

    async fn add_collaborator(&self, collaborator: Collaborator)
    -> Result<Collaborator, StorageError>;

    async fn update_collaborator(
        &self,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError>;

    async fn remove_collaborator(
        &self,
        manuscript_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), StorageError>;

    // Tracked changes

    async fn create_change(&self, change: TrackedChange) -> Result<TrackedChange, StorageError>;

    async fn get_change(
        &self,
        manuscript_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TrackedChange>, StorageError>;

    /// Look up by the client-generated correlation key
    async fn find_change_by_client_id(
        &self,
        manuscript_id: Uuid,
        change_id: &str,
    ) -> Result<Option<TrackedChange>, StorageError>;

    /// All changes for a manuscript, newest first
    async fn list_changes(&self, manuscript_id: Uuid) -> Result<Vec<TrackedChange>, StorageError>;

    /// Resolve a PENDING change. Returns `None` when the change is no longer pending.
    async fn resolve_change(
        &self,
        manuscript_id: Uuid,
        id: Uuid,
        status: ChangeStatus,
        resolved_by: Uuid,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<TrackedChange>, StorageError>;

    async fn delete_change(&self, manuscript_id: Uuid, id: Uuid) -> Result<(), StorageError>;

    // Versions

    /// Insert a snapshot, assigning the next version number within the same transaction
    async fn create_version(&self, version: NewVersion) -> Result<ManuscriptVersion, StorageError>;

    async fn get_version(
        &self,
        manuscript_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<ManuscriptVersion>, StorageError>;

    /// All versions for a manuscript, highest version number first
    async fn list_versions(
        &self,
        manuscript_id: Uuid,
    ) -> Result<Vec<ManuscriptVersion>, StorageError>;

    /// Snapshot the live manuscript as an AUTO version, then overwrite it with `target`.
    ///
    /// Both writes commit together or not at all.
    async fn restore_version(
        &self,
        target: &ManuscriptVersion,
        restored_by: Uuid,
        backup_description: String,
    ) -> Result<RestoreOutcome, StorageError>;

    // Invitations

    async fn create_invitation(&self, invitation: Invitation) -> Result<Invitation, StorageError>;

    async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>, StorageError>;

    async fn list_invitations_for_manuscript(
        &self,
        manuscript_id: Uuid,
    ) -> Result<Vec<Invitation>, StorageError>;

    /// Pending invitations addressed to an email (case-insensitive) or ORCID iD
    async fn list_pending_invitations_for(
        &self,
        email: &str,
        orcid_id: Option<&str>,
    ) -> Result<Vec<Invitation>, StorageError>;

    async fn set_invitation_status(
        &self,
        invitation_id: Uuid,
        status: InvitationStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> Result<Invitation, StorageError>;

    /// Mark a PENDING invitation accepted and insert the collaborator in one transaction
    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError>;

    // Notifications

    async fn create_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, StorageError>;

    /// Newest first
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, StorageError>;

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StorageError>;

    /// Returns false when the notification does not belong to the user
    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, StorageError>;

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, StorageError>;
}
