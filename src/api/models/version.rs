use super::enums::VersionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Immutable snapshot of a manuscript's title and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManuscriptVersion {
    pub id: Uuid,
    pub manuscript_id: Uuid,
    pub version_number: i32,
    pub title: String,
    pub content: String,
    #[schema(value_type = Option<Object>)]
    pub changes: Option<serde_json::Value>,
    pub created_by: Uuid,
    pub version_type: VersionType,
    pub description: Option<String>,
    pub word_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Version metadata without the content body, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: Uuid,
    pub manuscript_id: Uuid,
    pub version_number: i32,
    pub title: String,
    pub created_by: Uuid,
    pub version_type: VersionType,
    pub description: Option<String>,
    pub word_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&ManuscriptVersion> for VersionSummary {
    fn from(version: &ManuscriptVersion) -> Self {
        Self {
            id: version.id,
            manuscript_id: version.manuscript_id,
            version_number: version.version_number,
            title: version.title.clone(),
            created_by: version.created_by,
            version_type: version.version_type,
            description: version.description.clone(),
            word_count: version.word_count,
            created_at: version.created_at,
        }
    }
}

/// A snapshot waiting for storage to assign its id and version number.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub manuscript_id: Uuid,
    pub title: String,
    pub content: String,
    pub changes: Option<serde_json::Value>,
    pub created_by: Uuid,
    pub version_type: VersionType,
    pub description: Option<String>,
    pub word_count: i32,
}

impl NewVersion {
    pub fn into_version(self, version_number: i32, created_at: DateTime<Utc>) -> ManuscriptVersion {
        ManuscriptVersion {
            id: Uuid::new_v4(),
            manuscript_id: self.manuscript_id,
            version_number,
            title: self.title,
            content: self.content,
            changes: self.changes,
            created_by: self.created_by,
            version_type: self.version_type,
            description: self.description,
            word_count: self.word_count,
            created_at,
        }
    }
}

pub fn backup_description(target_version_number: i32) -> String {
    format!("Backup before restoring to version {}", target_version_number)
}
