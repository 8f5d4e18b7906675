//! Version snapshots and backup-before-restore.

use super::access_guard::AccessGuard;
use super::error::ServiceError;
use super::notification_service::NotificationService;
use crate::models::{
    ActivityEntry, Manuscript, ManuscriptVersion, NewVersion, Notification, NotificationType,
    Permission, User, VersionSummary, VersionType, backup_description,
};
use crate::storage::{ActivityLog, StorageBackend};
use crate::text::count_words;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    /// Defaults to the live manuscript title
    pub title: Option<String>,
    /// Defaults to the live manuscript content
    pub content: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub changes: Option<serde_json::Value>,
    /// "MANUAL" (default) or "AUTO"
    pub version_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResult {
    pub manuscript: Manuscript,
    pub restored_from_version: i32,
    pub backup_version: i32,
}

fn parse_version_type(value: Option<&str>) -> Result<VersionType, ServiceError> {
    match value {
        None => Ok(VersionType::default()),
        Some(raw) => raw.parse::<VersionType>().map_err(|_| {
            ServiceError::Validation("Invalid versionType. Must be MANUAL or AUTO".to_string())
        }),
    }
}

pub struct VersionService {
    storage: Arc<dyn StorageBackend>,
    guard: AccessGuard,
    notifications: NotificationService,
    activity: Arc<ActivityLog>,
}

impl VersionService {
    pub fn new(storage: Arc<dyn StorageBackend>, activity: Arc<ActivityLog>) -> Self {
        Self {
            guard: AccessGuard::new(storage.clone()),
            notifications: NotificationService::new(storage.clone()),
            storage,
            activity,
        }
    }

    pub async fn create_version(
        &self,
        manuscript_id: Uuid,
        user: &User,
        request: CreateVersionRequest,
    ) -> Result<ManuscriptVersion, ServiceError> {
        let manuscript = self
            .guard
            .require(user.id, manuscript_id, Permission::Edit)
            .await?;
        let version_type = parse_version_type(request.version_type.as_deref())?;

        let title = request.title.unwrap_or_else(|| manuscript.title.clone());
        let content = request.content.unwrap_or_else(|| manuscript.content.clone());
        let version = self
            .storage
            .create_version(NewVersion {
                manuscript_id,
                word_count: count_words(&content),
                title,
                content,
                changes: request.changes,
                created_by: user.id,
                version_type,
                description: request.description,
            })
            .await?;

        info!(
            manuscript_id = %manuscript_id,
            version_number = version.version_number,
            version_type = %version.version_type,
            "Version created"
        );
        self.activity
            .record(
                ActivityEntry::new(user.id, "version.created", "version", version.id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({
                        "versionNumber": version.version_number,
                        "versionType": version.version_type,
                    })),
            )
            .await;

        if !manuscript.is_creator(user.id) {
            self.notifications
                .send(Notification::new(
                    manuscript.created_by,
                    NotificationType::VersionCreated,
                    "New version saved",
                    format!(
                        "{} saved version {} of \"{}\"",
                        user.name, version.version_number, manuscript.title
                    ),
                    Some(manuscript_id),
                ))
                .await;
        }

        Ok(version)
    }

    pub async fn get_version(
        &self,
        manuscript_id: Uuid,
        version_id: Uuid,
        user: &User,
    ) -> Result<ManuscriptVersion, ServiceError> {
        self.guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;
        self.storage
            .get_version(manuscript_id, version_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Version not found".to_string()))
    }

    /// Metadata for every snapshot, highest version number first.
    pub async fn list_versions(
        &self,
        manuscript_id: Uuid,
        user: &User,
    ) -> Result<Vec<VersionSummary>, ServiceError> {
        self.guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;
        let versions = self.storage.list_versions(manuscript_id).await?;
        Ok(versions.iter().map(VersionSummary::from).collect())
    }

    /// Snapshot the live manuscript as an AUTO backup, then overwrite it from `version_id`.
    pub async fn restore(
        &self,
        manuscript_id: Uuid,
        version_id: Uuid,
        user: &User,
    ) -> Result<RestoreResult, ServiceError> {
        let manuscript = self
            .guard
            .require(user.id, manuscript_id, Permission::Edit)
            .await?;
        let target = self
            .storage
            .get_version(manuscript_id, version_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Version not found".to_string()))?;

        let outcome = self
            .storage
            .restore_version(&target, user.id, backup_description(target.version_number))
            .await?;

        info!(
            manuscript_id = %manuscript_id,
            restored_from = target.version_number,
            backup_version = outcome.backup.version_number,
            restored_by = %user.id,
            "Manuscript restored from version"
        );
        self.activity
            .record(
                ActivityEntry::new(user.id, "version.restored", "version", target.id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({
                        "restoredFromVersion": target.version_number,
                        "backupVersion": outcome.backup.version_number,
                    })),
            )
            .await;

        if !manuscript.is_creator(user.id) {
            self.notifications
                .send(Notification::new(
                    manuscript.created_by,
                    NotificationType::VersionRestored,
                    "Manuscript restored",
                    format!(
                        "{} restored \"{}\" to version {}",
                        user.name, manuscript.title, target.version_number
                    ),
                    Some(manuscript_id),
                ))
                .await;
        }

        Ok(RestoreResult {
            manuscript: outcome.manuscript,
            restored_from_version: target.version_number,
            backup_version: outcome.backup.version_number,
        })
    }
}
