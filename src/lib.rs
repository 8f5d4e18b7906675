//! Manuscript collaboration API: tracked changes, version snapshots,
//! invitations and notifications over HTTP.

pub mod api;
pub mod text;

// Re-export api modules at crate root so routes can use crate::services, crate::models
pub use api::config;
pub use api::middleware;
pub use api::models;
pub use api::routes;
pub use api::services;
pub use api::storage;
