//! Storage module for the API.
//!
//! Provides storage backends for PostgreSQL and in-memory storage, plus the
//! append-only activity log.

pub mod activity_log;
pub mod error;
pub mod traits;

// Storage backend implementations
pub mod memory;
pub mod postgres;

pub use activity_log::ActivityLog;
pub use error::StorageError;
pub use memory::MemoryStorageBackend;
pub use postgres::PostgresStorageBackend;
pub use traits::{RestoreOutcome, StorageBackend};
