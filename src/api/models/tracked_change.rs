use super::enums::ChangeStatus;
use super::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A proposed edit against a manuscript.
///
/// `start_offset`/`end_offset` index into the content as it was when the
/// change was proposed; they are not rebased when the content moves on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackedChange {
    pub id: Uuid,
    pub manuscript_id: Uuid,
    /// Client-generated correlation key
    pub change_id: String,
    #[serde(rename = "type")]
    pub change_type: String,
    pub operation: String,
    pub content: Option<String>,
    pub old_content: Option<String>,
    pub start_offset: i32,
    pub end_offset: i32,
    pub node_type: Option<String>,
    pub author_id: Uuid,
    pub status: ChangeStatus,
    /// Whoever resolved the change, for both accept and reject
    pub accepted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl TrackedChange {
    pub fn is_pending(&self) -> bool {
        self.status == ChangeStatus::Pending
    }

    /// Record the resolution. Exactly one of `accepted_at`/`rejected_at` ends up set.
    pub fn resolve(&mut self, status: ChangeStatus, resolved_by: Uuid, at: DateTime<Utc>) {
        self.status = status;
        self.accepted_by = Some(resolved_by);
        match status {
            ChangeStatus::Accepted => {
                self.accepted_at = Some(at);
                self.rejected_at = None;
            }
            ChangeStatus::Rejected => {
                self.accepted_at = None;
                self.rejected_at = Some(at);
            }
            ChangeStatus::Pending => {
                self.accepted_at = None;
                self.rejected_at = None;
            }
        }
    }
}

/// A tracked change with author and resolver identity attached.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackedChangeDetail {
    #[serde(flatten)]
    pub change: TrackedChange,
    pub author: Option<UserSummary>,
    pub resolver: Option<UserSummary>,
}
