//! Application state management.
//!
//! Holds the storage backend, the optional database pool, and the services
//! built on top of them. Cloned into every handler.

use crate::config::AppConfig;
use crate::services::{
    CollaboratorService, InvitationService, JwtService, ManuscriptService, NotificationService,
    OrcidClient, TrackedChangeService, VersionService,
};
use crate::storage::{
    ActivityLog, MemoryStorageBackend, PostgresStorageBackend, StorageBackend, StorageError,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageBackend>,
    /// PostgreSQL connection pool, when running against a database
    pub database: Option<PgPool>,
    pub jwt: Arc<JwtService>,
    pub orcid: Arc<OrcidClient>,
    pub activity: Arc<ActivityLog>,
    pub manuscripts: Arc<ManuscriptService>,
    pub changes: Arc<TrackedChangeService>,
    pub versions: Arc<VersionService>,
    pub collaborators: Arc<CollaboratorService>,
    pub invitations: Arc<InvitationService>,
    pub notifications: Arc<NotificationService>,
}

impl AppState {
    /// State backed by in-memory storage.
    pub fn new(config: &AppConfig) -> Self {
        let activity = Arc::new(match config.activity_log_path.as_ref() {
            Some(path) => ActivityLog::new(path),
            None => ActivityLog::disabled(),
        });
        Self::assemble(
            Arc::new(MemoryStorageBackend::new()),
            None,
            Arc::new(JwtService::new(&config.jwt_secret)),
            Arc::new(OrcidClient::new(config.orcid_api_url.clone())),
            activity,
        )
    }

    fn assemble(
        storage: Arc<dyn StorageBackend>,
        database: Option<PgPool>,
        jwt: Arc<JwtService>,
        orcid: Arc<OrcidClient>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            manuscripts: Arc::new(ManuscriptService::new(storage.clone(), activity.clone())),
            changes: Arc::new(TrackedChangeService::new(storage.clone(), activity.clone())),
            versions: Arc::new(VersionService::new(storage.clone(), activity.clone())),
            collaborators: Arc::new(CollaboratorService::new(storage.clone(), activity.clone())),
            invitations: Arc::new(InvitationService::new(storage.clone(), activity.clone())),
            notifications: Arc::new(NotificationService::new(storage.clone())),
            storage,
            database,
            jwt,
            orcid,
            activity,
        }
    }

    /// Replace the storage backend and rebuild the services on top of it.
    pub fn with_storage(self, storage: Arc<dyn StorageBackend>, database: Option<PgPool>) -> Self {
        Self::assemble(storage, database, self.jwt, self.orcid, self.activity)
    }

    /// Connect to PostgreSQL and run migrations when a database URL is configured,
    /// otherwise keep the in-memory backend.
    pub async fn init_storage(self, database_url: Option<&str>) -> Result<Self, StorageError> {
        let Some(database_url) = database_url else {
            info!("DATABASE_URL not set, using in-memory storage");
            return Ok(self);
        };

        let pool = PgPool::connect(database_url).await.map_err(|e| {
            StorageError::ConnectionError(format!("Failed to connect to database: {}", e))
        })?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::ConnectionError(format!("Migration failed: {}", e)))?;
        info!("Connected to PostgreSQL and applied migrations");

        let storage: Arc<dyn StorageBackend> = Arc::new(PostgresStorageBackend::new(pool.clone()));
        Ok(self.with_storage(storage, Some(pool)))
    }

    pub fn database(&self) -> Option<&PgPool> {
        self.database.as_ref()
    }

    pub fn is_postgres(&self) -> bool {
        self.database.is_some()
    }
}
