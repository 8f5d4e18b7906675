use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manuscript_id: Option<Uuid>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
}

impl ActivityEntry {
    pub fn new(
        user_id: Uuid,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl ToString,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.to_string(),
            manuscript_id: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn for_manuscript(mut self, manuscript_id: Uuid) -> Self {
        self.manuscript_id = Some(manuscript_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
