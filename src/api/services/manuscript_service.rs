//! Manuscript CRUD and the per-manuscript activity feed.

use super::access_guard::AccessGuard;
use super::error::ServiceError;
use crate::models::{ActivityEntry, Manuscript, ManuscriptStatus, Permission, User};
use crate::storage::{ActivityLog, StorageBackend};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;
pub const MAX_ACTIVITY_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateManuscriptRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManuscriptRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

fn parse_status(value: &str) -> Result<ManuscriptStatus, ServiceError> {
    value
        .parse::<ManuscriptStatus>()
        .map_err(|_| ServiceError::Validation(format!("Invalid manuscript status: {}", value)))
}

pub struct ManuscriptService {
    storage: Arc<dyn StorageBackend>,
    guard: AccessGuard,
    activity: Arc<ActivityLog>,
}

impl ManuscriptService {
    pub fn new(storage: Arc<dyn StorageBackend>, activity: Arc<ActivityLog>) -> Self {
        Self {
            guard: AccessGuard::new(storage.clone()),
            storage,
            activity,
        }
    }

    pub async fn create(
        &self,
        user: &User,
        request: CreateManuscriptRequest,
    ) -> Result<Manuscript, ServiceError> {
        let title = match request.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(ServiceError::missing_field("title")),
        };
        let status = match request.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => ManuscriptStatus::default(),
        };

        let manuscript = self
            .storage
            .create_manuscript(Manuscript::new(
                title,
                request.content.unwrap_or_default(),
                status,
                user.id,
            ))
            .await?;

        info!(manuscript_id = %manuscript.id, created_by = %user.id, "Manuscript created");
        self.activity
            .record(
                ActivityEntry::new(user.id, "manuscript.created", "manuscript", manuscript.id)
                    .for_manuscript(manuscript.id)
                    .with_details(json!({ "title": manuscript.title })),
            )
            .await;
        Ok(manuscript)
    }

    /// Manuscripts the user created or collaborates on, most recently updated first.
    pub async fn list(&self, user: &User) -> Result<Vec<Manuscript>, ServiceError> {
        Ok(self.storage.list_manuscripts_for_user(user.id).await?)
    }

    pub async fn get(&self, manuscript_id: Uuid, user: &User) -> Result<Manuscript, ServiceError> {
        self.guard
            .require(user.id, manuscript_id, Permission::View)
            .await
    }

    pub async fn update(
        &self,
        manuscript_id: Uuid,
        user: &User,
        request: UpdateManuscriptRequest,
    ) -> Result<Manuscript, ServiceError> {
        let mut manuscript = self
            .guard
            .require(user.id, manuscript_id, Permission::Edit)
            .await?;

        let mut fields = Vec::new();
        if let Some(title) = request.title {
            if title.trim().is_empty() {
                return Err(ServiceError::Validation("Title cannot be empty".to_string()));
            }
            manuscript.title = title;
            fields.push("title");
        }
        if let Some(status) = request.status.as_deref() {
            manuscript.status = parse_status(status)?;
            fields.push("status");
        }
        if let Some(content) = request.content {
            manuscript.set_content(content);
            fields.push("content");
        }
        manuscript.updated_at = Utc::now();

        let manuscript = self.storage.update_manuscript(manuscript).await?;

        info!(manuscript_id = %manuscript_id, updated_by = %user.id, "Manuscript updated");
        self.activity
            .record(
                ActivityEntry::new(user.id, "manuscript.updated", "manuscript", manuscript_id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({ "fields": fields })),
            )
            .await;
        Ok(manuscript)
    }

    pub async fn delete(&self, manuscript_id: Uuid, user: &User) -> Result<(), ServiceError> {
        let manuscript = self
            .guard
            .require(user.id, manuscript_id, Permission::Delete)
            .await?;
        self.storage.delete_manuscript(manuscript_id).await?;

        info!(manuscript_id = %manuscript_id, deleted_by = %user.id, "Manuscript deleted");
        self.activity
            .record(
                ActivityEntry::new(user.id, "manuscript.deleted", "manuscript", manuscript_id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({ "title": manuscript.title })),
            )
            .await;
        Ok(())
    }

    /// Newest activity entries for the manuscript.
    pub async fn recent_activity(
        &self,
        manuscript_id: Uuid,
        user: &User,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityEntry>, ServiceError> {
        self.guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;
        let limit = limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        Ok(self.activity.recent(manuscript_id, limit).await?)
    }
}
