//! Notification inbox operations.

use super::error::ServiceError;
use crate::models::{Notification, User};
use crate::storage::StorageBackend;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;
pub const MAX_NOTIFICATION_LIMIT: i64 = 100;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub updated: u64,
}

#[derive(Clone)]
pub struct NotificationService {
    storage: Arc<dyn StorageBackend>,
}

impl NotificationService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Deliver a notification. Failures are logged and swallowed so they never
    /// undo the operation that triggered them.
    pub async fn send(&self, notification: Notification) {
        let user_id = notification.user_id;
        let kind = notification.notification_type;
        if let Err(e) = self.storage.create_notification(notification).await {
            warn!(user_id = %user_id, kind = %kind, "Failed to create notification: {}", e);
        }
    }

    pub async fn list(
        &self,
        user: &User,
        unread_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .clamp(1, MAX_NOTIFICATION_LIMIT);
        Ok(self
            .storage
            .list_notifications(user.id, unread_only, limit)
            .await?)
    }

    pub async fn unread_count(&self, user: &User) -> Result<UnreadCount, ServiceError> {
        let unread = self.storage.count_unread_notifications(user.id).await?;
        Ok(UnreadCount { unread })
    }

    pub async fn mark_read(&self, user: &User, notification_id: Uuid) -> Result<(), ServiceError> {
        if self
            .storage
            .mark_notification_read(user.id, notification_id)
            .await?
        {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Notification not found".to_string()))
        }
    }

    pub async fn mark_all_read(&self, user: &User) -> Result<MarkedRead, ServiceError> {
        let updated = self.storage.mark_all_notifications_read(user.id).await?;
        Ok(MarkedRead { updated })
    }
}
