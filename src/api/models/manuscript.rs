use super::enums::ManuscriptStatus;
use crate::text::count_words;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Manuscript {
    pub id: Uuid,
    pub title: String,
    /// Rich text (HTML) body
    pub content: String,
    pub word_count: i32,
    pub status: ManuscriptStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Manuscript {
    pub fn new(
        title: String,
        content: String,
        status: ManuscriptStatus,
        created_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            word_count: count_words(&content),
            title,
            content,
            status,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the body and keep the derived word count in step.
    pub fn set_content(&mut self, content: String) {
        self.word_count = count_words(&content);
        self.content = content;
    }

    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }
}
