//! Tracked-change ledger: propose, resolve, remove and list proposed edits.

use super::access_guard::AccessGuard;
use super::error::ServiceError;
use super::notification_service::NotificationService;
use super::user_lookup::UserLookup;
use crate::models::{
    ActivityEntry, ChangeStatus, Manuscript, Notification, NotificationType, Permission,
    TrackedChange, TrackedChangeDetail, User, UserSummary,
};
use crate::storage::{ActivityLog, StorageBackend};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// Body of a change proposal. Every field is optional at the wire level so
/// that a missing field is reported as a validation error, not a parse error.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposeChangeRequest {
    pub change_id: Option<String>,
    #[serde(rename = "type")]
    pub change_type: Option<String>,
    pub operation: Option<String>,
    pub content: Option<String>,
    pub old_content: Option<String>,
    pub start_offset: Option<i32>,
    pub end_offset: Option<i32>,
    pub node_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveChangeRequest {
    /// "ACCEPTED" or "REJECTED"
    pub status: Option<String>,
}

fn required_text(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::missing_field(field)),
    }
}

fn parse_resolution(status: Option<&str>) -> Result<ChangeStatus, ServiceError> {
    match status {
        Some("ACCEPTED") => Ok(ChangeStatus::Accepted),
        Some("REJECTED") => Ok(ChangeStatus::Rejected),
        _ => Err(ServiceError::Validation(
            "Invalid status. Must be ACCEPTED or REJECTED".to_string(),
        )),
    }
}

pub struct TrackedChangeService {
    storage: Arc<dyn StorageBackend>,
    guard: AccessGuard,
    notifications: NotificationService,
    activity: Arc<ActivityLog>,
}

impl TrackedChangeService {
    pub fn new(storage: Arc<dyn StorageBackend>, activity: Arc<ActivityLog>) -> Self {
        Self {
            guard: AccessGuard::new(storage.clone()),
            notifications: NotificationService::new(storage.clone()),
            storage,
            activity,
        }
    }

    /// Record a PENDING change. Any collaborator who can view the manuscript may propose.
    pub async fn propose(
        &self,
        manuscript_id: Uuid,
        author: &User,
        request: ProposeChangeRequest,
    ) -> Result<TrackedChangeDetail, ServiceError> {
        let manuscript = self
            .guard
            .require(author.id, manuscript_id, Permission::View)
            .await?;

        let change_id = required_text(request.change_id, "changeId")?;
        let change_type = required_text(request.change_type, "type")?;
        let operation = required_text(request.operation, "operation")?;
        // Zero is a valid offset; only absence is an error
        let start_offset = request
            .start_offset
            .ok_or_else(|| ServiceError::missing_field("startOffset"))?;
        let end_offset = request
            .end_offset
            .ok_or_else(|| ServiceError::missing_field("endOffset"))?;
        if start_offset < 0 || end_offset < 0 {
            return Err(ServiceError::Validation(
                "Offsets must be non-negative".to_string(),
            ));
        }
        if end_offset < start_offset {
            return Err(ServiceError::Validation(
                "endOffset must not be before startOffset".to_string(),
            ));
        }

        let change = TrackedChange {
            id: Uuid::new_v4(),
            manuscript_id,
            change_id,
            change_type,
            operation,
            content: request.content,
            old_content: request.old_content,
            start_offset,
            end_offset,
            node_type: request.node_type,
            author_id: author.id,
            status: ChangeStatus::Pending,
            accepted_by: None,
            created_at: Utc::now(),
            accepted_at: None,
            rejected_at: None,
        };
        let change = self.storage.create_change(change).await?;

        info!(
            manuscript_id = %manuscript_id,
            change_id = %change.change_id,
            author_id = %author.id,
            "Tracked change proposed"
        );
        self.activity
            .record(
                ActivityEntry::new(author.id, "change.proposed", "tracked_change", change.id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({
                        "changeId": change.change_id,
                        "type": change.change_type,
                        "operation": change.operation,
                    })),
            )
            .await;

        if !manuscript.is_creator(author.id) {
            self.notifications
                .send(Notification::new(
                    manuscript.created_by,
                    NotificationType::ChangeProposed,
                    "New tracked change",
                    format!("{} proposed a change to \"{}\"", author.name, manuscript.title),
                    Some(manuscript_id),
                ))
                .await;
        }

        Ok(TrackedChangeDetail {
            change,
            author: Some(UserSummary::from(author)),
            resolver: None,
        })
    }

    /// Accept or reject a PENDING change. `accepted_by` records the resolver either way.
    pub async fn resolve(
        &self,
        manuscript_id: Uuid,
        change_ref: &str,
        user: &User,
        request: ResolveChangeRequest,
    ) -> Result<TrackedChangeDetail, ServiceError> {
        let manuscript = self
            .guard
            .require(user.id, manuscript_id, Permission::Edit)
            .await?;
        let status = parse_resolution(request.status.as_deref())?;
        let existing = self.find_change(&manuscript, change_ref).await?;

        let Some(change) = self
            .storage
            .resolve_change(manuscript_id, existing.id, status, user.id, Utc::now())
            .await?
        else {
            return Err(self.already_resolved(manuscript_id, existing.id).await);
        };

        info!(
            manuscript_id = %manuscript_id,
            change_id = %change.change_id,
            status = %status,
            resolved_by = %user.id,
            "Tracked change resolved"
        );
        self.activity
            .record(
                ActivityEntry::new(user.id, "change.resolved", "tracked_change", change.id)
                    .for_manuscript(manuscript_id)
                    .with_details(json!({ "status": status })),
            )
            .await;

        if change.author_id != user.id {
            self.notifications
                .send(Notification::new(
                    change.author_id,
                    NotificationType::ChangeResolved,
                    "Tracked change resolved",
                    format!(
                        "{} marked your change to \"{}\" as {}",
                        user.name,
                        manuscript.title,
                        status.as_str().to_lowercase()
                    ),
                    Some(manuscript_id),
                ))
                .await;
        }

        let mut users = UserLookup::new(self.storage.as_ref());
        Ok(TrackedChangeDetail {
            author: users.summary(change.author_id).await?,
            resolver: Some(UserSummary::from(user)),
            change,
        })
    }

    /// Delete a change. Only its author or the manuscript creator may do so.
    pub async fn remove(
        &self,
        manuscript_id: Uuid,
        change_ref: &str,
        user: &User,
    ) -> Result<(), ServiceError> {
        let manuscript = self
            .guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;
        let change = self.find_change(&manuscript, change_ref).await?;

        if change.author_id != user.id && !manuscript.is_creator(user.id) {
            return Err(ServiceError::Forbidden(
                "Only the change author or the manuscript owner can delete this change"
                    .to_string(),
            ));
        }

        self.storage.delete_change(manuscript_id, change.id).await?;

        info!(
            manuscript_id = %manuscript_id,
            change_id = %change.change_id,
            deleted_by = %user.id,
            "Tracked change deleted"
        );
        self.activity
            .record(
                ActivityEntry::new(user.id, "change.deleted", "tracked_change", change.id)
                    .for_manuscript(manuscript_id),
            )
            .await;
        Ok(())
    }

    /// All changes on a manuscript, newest first.
    pub async fn list(
        &self,
        manuscript_id: Uuid,
        user: &User,
    ) -> Result<Vec<TrackedChangeDetail>, ServiceError> {
        self.guard
            .require(user.id, manuscript_id, Permission::View)
            .await?;

        let changes = self.storage.list_changes(manuscript_id).await?;
        let mut users = UserLookup::new(self.storage.as_ref());
        let mut details = Vec::with_capacity(changes.len());
        for change in changes {
            details.push(TrackedChangeDetail {
                author: users.summary(change.author_id).await?,
                resolver: users.optional(change.accepted_by).await?,
                change,
            });
        }
        Ok(details)
    }

    /// Resolve a path reference as a record id first, then as the client correlation key.
    /// Error for a change that lost the race to pending, naming its current status.
    async fn already_resolved(&self, manuscript_id: Uuid, id: Uuid) -> ServiceError {
        match self.storage.get_change(manuscript_id, id).await {
            Ok(Some(current)) => ServiceError::Validation(format!(
                "Change has already been {}",
                current.status.as_str().to_lowercase()
            )),
            Ok(None) => ServiceError::NotFound("Tracked change not found".to_string()),
            Err(e) => e.into(),
        }
    }

    async fn find_change(
        &self,
        manuscript: &Manuscript,
        change_ref: &str,
    ) -> Result<TrackedChange, ServiceError> {
        let by_id = match Uuid::parse_str(change_ref) {
            Ok(id) => self.storage.get_change(manuscript.id, id).await?,
            Err(_) => None,
        };
        let change = match by_id {
            Some(change) => Some(change),
            None => {
                self.storage
                    .find_change_by_client_id(manuscript.id, change_ref)
                    .await?
            }
        };
        change.ok_or_else(|| ServiceError::NotFound("Tracked change not found".to_string()))
    }
}
