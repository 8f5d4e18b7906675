//! PostgreSQL storage backend implementation.
//!
//! Uses sqlx for database operations and implements the StorageBackend trait.
//! Enum columns are stored as TEXT and parsed on the way out.

use super::{StorageError, traits::*};
use crate::models::{
    ChangeStatus, Collaborator, Invitation, InvitationStatus, Manuscript, ManuscriptVersion,
    NewVersion, Notification, ParseEnumError, TrackedChange, User, VersionType,
};
use crate::text::count_words;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, orcid_id, institution, created_at";
const MANUSCRIPT_COLUMNS: &str =
    "id, title, content, word_count, status, created_by, created_at, updated_at";
const COLLABORATOR_COLUMNS: &str = "id, manuscript_id, user_id, role, can_edit, can_invite, can_delete, added_by, created_at, updated_at";
const CHANGE_COLUMNS: &str = "id, manuscript_id, change_id, change_type, operation, content, old_content, start_offset, end_offset, node_type, author_id, status, accepted_by, created_at, accepted_at, rejected_at";
const VERSION_COLUMNS: &str = "id, manuscript_id, version_number, title, content, changes, created_by, version_type, description, word_count, created_at";
const INVITATION_COLUMNS: &str = "id, manuscript_id, inviter_id, invitee_email, invitee_orcid, invitee_name, role, can_edit, can_invite, can_delete, message, status, token, expires_at, created_at, responded_at";
const NOTIFICATION_COLUMNS: &str =
    "id, user_id, notification_type, title, message, manuscript_id, is_read, created_at";

fn parse_enum<T: FromStr<Err = ParseEnumError>>(value: &str) -> Result<T, StorageError> {
    value
        .parse()
        .map_err(|e: ParseEnumError| StorageError::Other(e.to_string()))
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    orcid_id: Option<String>,
    institution: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            name: r.name,
            email: r.email,
            orcid_id: r.orcid_id,
            institution: r.institution,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ManuscriptRow {
    id: Uuid,
    title: String,
    content: String,
    word_count: i32,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ManuscriptRow> for Manuscript {
    type Error = StorageError;

    fn try_from(r: ManuscriptRow) -> Result<Self, Self::Error> {
        Ok(Manuscript {
            id: r.id,
            title: r.title,
            content: r.content,
            word_count: r.word_count,
            status: parse_enum(&r.status)?,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CollaboratorRow {
    id: Uuid,
    manuscript_id: Uuid,
    user_id: Uuid,
    role: String,
    can_edit: bool,
    can_invite: bool,
    can_delete: bool,
    added_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CollaboratorRow> for Collaborator {
    type Error = StorageError;

    fn try_from(r: CollaboratorRow) -> Result<Self, Self::Error> {
        Ok(Collaborator {
            id: r.id,
            manuscript_id: r.manuscript_id,
            user_id: r.user_id,
            role: parse_enum(&r.role)?,
            can_edit: r.can_edit,
            can_invite: r.can_invite,
            can_delete: r.can_delete,
            added_by: r.added_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ChangeRow {
    id: Uuid,
    manuscript_id: Uuid,
    change_id: String,
    change_type: String,
    operation: String,
    content: Option<String>,
    old_content: Option<String>,
    start_offset: i32,
    end_offset: i32,
    node_type: Option<String>,
    author_id: Uuid,
    status: String,
    accepted_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
}

impl TryFrom<ChangeRow> for TrackedChange {
    type Error = StorageError;

    fn try_from(r: ChangeRow) -> Result<Self, Self::Error> {
        Ok(TrackedChange {
            id: r.id,
            manuscript_id: r.manuscript_id,
            change_id: r.change_id,
            change_type: r.change_type,
            operation: r.operation,
            content: r.content,
            old_content: r.old_content,
            start_offset: r.start_offset,
            end_offset: r.end_offset,
            node_type: r.node_type,
            author_id: r.author_id,
            status: parse_enum(&r.status)?,
            accepted_by: r.accepted_by,
            created_at: r.created_at,
            accepted_at: r.accepted_at,
            rejected_at: r.rejected_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VersionRow {
    id: Uuid,
    manuscript_id: Uuid,
    version_number: i32,
    title: String,
    content: String,
    changes: Option<serde_json::Value>,
    created_by: Uuid,
    version_type: String,
    description: Option<String>,
    word_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<VersionRow> for ManuscriptVersion {
    type Error = StorageError;

    fn try_from(r: VersionRow) -> Result<Self, Self::Error> {
        Ok(ManuscriptVersion {
            id: r.id,
            manuscript_id: r.manuscript_id,
            version_number: r.version_number,
            title: r.title,
            content: r.content,
            changes: r.changes,
            created_by: r.created_by,
            version_type: parse_enum(&r.version_type)?,
            description: r.description,
            word_count: r.word_count,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InvitationRow {
    id: Uuid,
    manuscript_id: Uuid,
    inviter_id: Uuid,
    invitee_email: Option<String>,
    invitee_orcid: Option<String>,
    invitee_name: Option<String>,
    role: String,
    can_edit: bool,
    can_invite: bool,
    can_delete: bool,
    message: Option<String>,
    status: String,
    token: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = StorageError;

    fn try_from(r: InvitationRow) -> Result<Self, Self::Error> {
        Ok(Invitation {
            id: r.id,
            manuscript_id: r.manuscript_id,
            inviter_id: r.inviter_id,
            invitee_email: r.invitee_email,
            invitee_orcid: r.invitee_orcid,
            invitee_name: r.invitee_name,
            role: parse_enum(&r.role)?,
            can_edit: r.can_edit,
            can_invite: r.can_invite,
            can_delete: r.can_delete,
            message: r.message,
            status: parse_enum(&r.status)?,
            token: r.token,
            expires_at: r.expires_at,
            created_at: r.created_at,
            responded_at: r.responded_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    notification_type: String,
    title: String,
    message: String,
    manuscript_id: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StorageError;

    fn try_from(r: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: r.id,
            user_id: r.user_id,
            notification_type: parse_enum(&r.notification_type)?,
            title: r.title,
            message: r.message,
            manuscript_id: r.manuscript_id,
            is_read: r.is_read,
            created_at: r.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StorageError>
where
    T: TryFrom<R, Error = StorageError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// PostgreSQL storage backend implementation.
pub struct PostgresStorageBackend {
    pool: PgPool,
}

impl PostgresStorageBackend {
    /// Create a new PostgreSQL storage backend.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_version<'c, E>(executor: E, version: &ManuscriptVersion) -> Result<(), StorageError>
    where
        E: sqlx::Executor<'c, Database = sqlx::Postgres>,
    {
        sqlx::query(&format!(
            "INSERT INTO manuscript_versions ({VERSION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(version.id)
        .bind(version.manuscript_id)
        .bind(version.version_number)
        .bind(&version.title)
        .bind(&version.content)
        .bind(&version.changes)
        .bind(version.created_by)
        .bind(version.version_type.as_str())
        .bind(&version.description)
        .bind(version.word_count)
        .bind(version.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    async fn insert_collaborator<'c, E>(
        executor: E,
        collaborator: &Collaborator,
    ) -> Result<(), StorageError>
    where
        E: sqlx::Executor<'c, Database = sqlx::Postgres>,
    {
        sqlx::query(&format!(
            "INSERT INTO manuscript_collaborators ({COLLABORATOR_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(collaborator.id)
        .bind(collaborator.manuscript_id)
        .bind(collaborator.user_id)
        .bind(collaborator.role.as_str())
        .bind(collaborator.can_edit)
        .bind(collaborator.can_invite)
        .bind(collaborator.can_delete)
        .bind(collaborator.added_by)
        .bind(collaborator.created_at)
        .bind(collaborator.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for PostgresStorageBackend {
    async fn create_user(&self, user: User) -> Result<User, StorageError> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.orcid_id)
        .bind(&user.institution)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_orcid(&self, orcid_id: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE orcid_id = $1"
        ))
        .bind(orcid_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn create_manuscript(&self, manuscript: Manuscript) -> Result<Manuscript, StorageError> {
        sqlx::query(&format!(
            "INSERT INTO manuscripts ({MANUSCRIPT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(manuscript.id)
        .bind(&manuscript.title)
        .bind(&manuscript.content)
        .bind(manuscript.word_count)
        .bind(manuscript.status.as_str())
        .bind(manuscript.created_by)
        .bind(manuscript.created_at)
        .bind(manuscript.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(manuscript)
    }

    async fn get_manuscript(&self, manuscript_id: Uuid) -> Result<Option<Manuscript>, StorageError> {
        sqlx::query_as::<_, ManuscriptRow>(&format!(
            "SELECT {MANUSCRIPT_COLUMNS} FROM manuscripts WHERE id = $1"
        ))
        .bind(manuscript_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Manuscript::try_from)
        .transpose()
    }

    async fn list_manuscripts_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Manuscript>, StorageError> {
        let rows = sqlx::query_as::<_, ManuscriptRow>(
            r#"
            SELECT m.id, m.title, m.content, m.word_count, m.status, m.created_by, m.created_at, m.updated_at
            FROM manuscripts m
            LEFT JOIN manuscript_collaborators c
                ON c.manuscript_id = m.id AND c.user_id = $1
            WHERE m.created_by = $1 OR c.user_id IS NOT NULL
            ORDER BY m.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn update_manuscript(&self, manuscript: Manuscript) -> Result<Manuscript, StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE manuscripts
            SET title = $1, content = $2, word_count = $3, status = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&manuscript.title)
        .bind(&manuscript.content)
        .bind(manuscript.word_count)
        .bind(manuscript.status.as_str())
        .bind(manuscript.updated_at)
        .bind(manuscript.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            Err(StorageError::not_found("manuscript", manuscript.id))
        } else {
            Ok(manuscript)
        }
    }

    async fn delete_manuscript(&self, manuscript_id: Uuid) -> Result<(), StorageError> {
        // Dependent rows go with ON DELETE CASCADE
        let rows_affected = sqlx::query("DELETE FROM manuscripts WHERE id = $1")
            .bind(manuscript_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            Err(StorageError::not_found("manuscript", manuscript_id))
        } else {
            Ok(())
        }
    }

    async fn get_collaborator(
        &self,
        manuscript_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Collaborator>, StorageError> {
        sqlx::query_as::<_, CollaboratorRow>(&format!(
            "SELECT {COLLABORATOR_COLUMNS} FROM manuscript_collaborators WHERE manuscript_id = $1 AND user_id = $2"
        ))
        .bind(manuscript_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Collaborator::try_from)
        .transpose()
    }

    async fn list_collaborators(
        &self,
        manuscript_id: Uuid,
    ) -> Result<Vec<Collaborator>, StorageError> {
        let rows = sqlx::query_as::<_, CollaboratorRow>(&format!(
            "SELECT {COLLABORATOR_COLUMNS} FROM manuscript_collaborators WHERE manuscript_id = $1 ORDER BY created_at"
        ))
        .bind(manuscript_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn add_collaborator(
        &self,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError> {
        Self::insert_collaborator(&self.pool, &collaborator).await?;
        Ok(collaborator)
    }

    async fn update_collaborator(
        &self,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE manuscript_collaborators
            SET role = $1, can_edit = $2, can_invite = $3, can_delete = $4, updated_at = $5
            WHERE manuscript_id = $6 AND user_id = $7
            "#,
        )
        .bind(collaborator.role.as_str())
        .bind(collaborator.can_edit)
        .bind(collaborator.can_invite)
        .bind(collaborator.can_delete)
        .bind(collaborator.updated_at)
        .bind(collaborator.manuscript_id)
        .bind(collaborator.user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            Err(StorageError::not_found("collaborator", collaborator.user_id))
        } else {
            Ok(collaborator)
        }
    }

    async fn remove_collaborator(
        &self,
        manuscript_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            "DELETE FROM manuscript_collaborators WHERE manuscript_id = $1 AND user_id = $2",
        )
        .bind(manuscript_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            Err(StorageError::not_found("collaborator", user_id))
        } else {
            Ok(())
        }
    }

    async fn create_change(&self, change: TrackedChange) -> Result<TrackedChange, StorageError> {
        sqlx::query(&format!(
            "INSERT INTO tracked_changes ({CHANGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(change.id)
        .bind(change.manuscript_id)
        .bind(&change.change_id)
        .bind(&change.change_type)
        .bind(&change.operation)
        .bind(&change.content)
        .bind(&change.old_content)
        .bind(change.start_offset)
        .bind(change.end_offset)
        .bind(&change.node_type)
        .bind(change.author_id)
        .bind(change.status.as_str())
        .bind(change.accepted_by)
        .bind(change.created_at)
        .bind(change.accepted_at)
        .bind(change.rejected_at)
        .execute(&self.pool)
        .await?;
        Ok(change)
    }

    async fn get_change(
        &self,
        manuscript_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TrackedChange>, StorageError> {
        sqlx::query_as::<_, ChangeRow>(&format!(
            "SELECT {CHANGE_COLUMNS} FROM tracked_changes WHERE manuscript_id = $1 AND id = $2"
        ))
        .bind(manuscript_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(TrackedChange::try_from)
        .transpose()
    }

    async fn find_change_by_client_id(
        &self,
        manuscript_id: Uuid,
        change_id: &str,
    ) -> Result<Option<TrackedChange>, StorageError> {
        sqlx::query_as::<_, ChangeRow>(&format!(
            "SELECT {CHANGE_COLUMNS} FROM tracked_changes WHERE manuscript_id = $1 AND change_id = $2 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(manuscript_id)
        .bind(change_id)
        .fetch_optional(&self.pool)
        .await?
        .map(TrackedChange::try_from)
        .transpose()
    }

    async fn list_changes(&self, manuscript_id: Uuid) -> Result<Vec<TrackedChange>, StorageError> {
        let rows = sqlx::query_as::<_, ChangeRow>(&format!(
            "SELECT {CHANGE_COLUMNS} FROM tracked_changes WHERE manuscript_id = $1 ORDER BY created_at DESC"
        ))
        .bind(manuscript_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn resolve_change(
        &self,
        manuscript_id: Uuid,
        id: Uuid,
        status: ChangeStatus,
        resolved_by: Uuid,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<TrackedChange>, StorageError> {
        let (accepted_at, rejected_at) = match status {
            ChangeStatus::Accepted => (Some(resolved_at), None),
            ChangeStatus::Rejected => (None, Some(resolved_at)),
            ChangeStatus::Pending => (None, None),
        };

        // Conditional on PENDING so two resolvers cannot both win
        let row = sqlx::query_as::<_, ChangeRow>(&format!(
            r#"
            UPDATE tracked_changes
            SET status = $1, accepted_by = $2, accepted_at = $3, rejected_at = $4
            WHERE manuscript_id = $5 AND id = $6 AND status = 'PENDING'
            RETURNING {CHANGE_COLUMNS}
            "#
        ))
        .bind(status.as_str())
        .bind(resolved_by)
        .bind(accepted_at)
        .bind(rejected_at)
        .bind(manuscript_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(TrackedChange::try_from(row)?)),
            None => match self.get_change(manuscript_id, id).await? {
                Some(_) => Ok(None),
                None => Err(StorageError::not_found("tracked_change", id)),
            },
        }
    }

    async fn delete_change(&self, manuscript_id: Uuid, id: Uuid) -> Result<(), StorageError> {
        let rows_affected =
            sqlx::query("DELETE FROM tracked_changes WHERE manuscript_id = $1 AND id = $2")
                .bind(manuscript_id)
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if rows_affected == 0 {
            Err(StorageError::not_found("tracked_change", id))
        } else {
            Ok(())
        }
    }

    async fn create_version(&self, version: NewVersion) -> Result<ManuscriptVersion, StorageError> {
        let mut tx = self.pool.begin().await?;

        // Serialises version numbering per manuscript
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM manuscripts WHERE id = $1 FOR UPDATE")
                .bind(version.manuscript_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(StorageError::not_found("manuscript", version.manuscript_id));
        }

        let next_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM manuscript_versions WHERE manuscript_id = $1",
        )
        .bind(version.manuscript_id)
        .fetch_one(&mut *tx)
        .await?;

        let version = version.into_version(next_number, Utc::now());
        Self::insert_version(&mut *tx, &version).await?;
        tx.commit().await?;

        Ok(version)
    }

    async fn get_version(
        &self,
        manuscript_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<ManuscriptVersion>, StorageError> {
        sqlx::query_as::<_, VersionRow>(&format!(
            "SELECT {VERSION_COLUMNS} FROM manuscript_versions WHERE manuscript_id = $1 AND id = $2"
        ))
        .bind(manuscript_id)
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await?
        .map(ManuscriptVersion::try_from)
        .transpose()
    }

    async fn list_versions(
        &self,
        manuscript_id: Uuid,
    ) -> Result<Vec<ManuscriptVersion>, StorageError> {
        let rows = sqlx::query_as::<_, VersionRow>(&format!(
            "SELECT {VERSION_COLUMNS} FROM manuscript_versions WHERE manuscript_id = $1 ORDER BY version_number DESC"
        ))
        .bind(manuscript_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn restore_version(
        &self,
        target: &ManuscriptVersion,
        restored_by: Uuid,
        backup_description: String,
    ) -> Result<RestoreOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;

        let live = sqlx::query_as::<_, ManuscriptRow>(&format!(
            "SELECT {MANUSCRIPT_COLUMNS} FROM manuscripts WHERE id = $1 FOR UPDATE"
        ))
        .bind(target.manuscript_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Manuscript::try_from)
        .transpose()?
        .ok_or_else(|| StorageError::not_found("manuscript", target.manuscript_id))?;

        let next_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM manuscript_versions WHERE manuscript_id = $1",
        )
        .bind(live.id)
        .fetch_one(&mut *tx)
        .await?;

        let now = Utc::now();
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
        .into_version(next_number, now);
        Self::insert_version(&mut *tx, &backup).await?;

        sqlx::query(
            r#"
            UPDATE manuscripts
            SET title = $1, content = $2, word_count = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(&target.title)
        .bind(&target.content)
        .bind(target.word_count)
        .bind(now)
        .bind(live.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut manuscript = live;
        manuscript.title = target.title.clone();
        manuscript.content = target.content.clone();
        manuscript.word_count = target.word_count;
        manuscript.updated_at = now;

        Ok(RestoreOutcome { manuscript, backup })
    }

    async fn create_invitation(&self, invitation: Invitation) -> Result<Invitation, StorageError> {
        sqlx::query(&format!(
            "INSERT INTO invitations ({INVITATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(invitation.id)
        .bind(invitation.manuscript_id)
        .bind(invitation.inviter_id)
        .bind(&invitation.invitee_email)
        .bind(&invitation.invitee_orcid)
        .bind(&invitation.invitee_name)
        .bind(invitation.role.as_str())
        .bind(invitation.can_edit)
        .bind(invitation.can_invite)
        .bind(invitation.can_delete)
        .bind(&invitation.message)
        .bind(invitation.status.as_str())
        .bind(&invitation.token)
        .bind(invitation.expires_at)
        .bind(invitation.created_at)
        .bind(invitation.responded_at)
        .execute(&self.pool)
        .await?;
        Ok(invitation)
    }

    async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>, StorageError> {
        sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1"
        ))
        .bind(invitation_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Invitation::try_from)
        .transpose()
    }

    async fn list_invitations_for_manuscript(
        &self,
        manuscript_id: Uuid,
    ) -> Result<Vec<Invitation>, StorageError> {
        let rows = sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE manuscript_id = $1 ORDER BY created_at DESC"
        ))
        .bind(manuscript_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_pending_invitations_for(
        &self,
        email: &str,
        orcid_id: Option<&str>,
    ) -> Result<Vec<Invitation>, StorageError> {
        let rows = sqlx::query_as::<_, InvitationRow>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE status = 'PENDING'
              AND (LOWER(invitee_email) = LOWER($1) OR ($2::TEXT IS NOT NULL AND invitee_orcid = $2))
            ORDER BY created_at DESC
            "#
        ))
        .bind(email)
        .bind(orcid_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn set_invitation_status(
        &self,
        invitation_id: Uuid,
        status: InvitationStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> Result<Invitation, StorageError> {
        sqlx::query_as::<_, InvitationRow>(&format!(
            "UPDATE invitations SET status = $1, responded_at = $2 WHERE id = $3 RETURNING {INVITATION_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(responded_at)
        .bind(invitation_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Invitation::try_from)
        .transpose()?
        .ok_or_else(|| StorageError::not_found("invitation", invitation_id))
    }

    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError> {
        let mut tx = self.pool.begin().await?;

        let rows_affected = sqlx::query(
            "UPDATE invitations SET status = 'ACCEPTED', responded_at = $1 WHERE id = $2 AND status = 'PENDING'",
        )
        .bind(collaborator.created_at)
        .bind(invitation_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM invitations WHERE id = $1")
                .bind(invitation_id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => StorageError::Conflict(format!(
                    "invitation {} is no longer pending",
                    invitation_id
                )),
                None => StorageError::not_found("invitation", invitation_id),
            });
        }

        Self::insert_collaborator(&mut *tx, &collaborator).await?;
        tx.commit().await?;

        Ok(collaborator)
    }

    async fn create_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, StorageError> {
        sqlx::query(&format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.manuscript_id)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, StorageError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, StorageError> {
        let rows_affected =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(notification_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(rows_affected > 0)
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, StorageError> {
        let rows_affected = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows_affected)
    }
}
