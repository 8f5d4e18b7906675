use crate::models::UserSummary;
use crate::storage::{StorageBackend, StorageError};
use std::collections::HashMap;
use uuid::Uuid;

/// Memoised user summaries for attaching identities to listings.
pub(crate) struct UserLookup<'a> {
    storage: &'a dyn StorageBackend,
    cache: HashMap<Uuid, Option<UserSummary>>,
}

impl<'a> UserLookup<'a> {
    pub(crate) fn new(storage: &'a dyn StorageBackend) -> Self {
        Self {
            storage,
            cache: HashMap::new(),
        }
    }

    pub(crate) async fn summary(&mut self, user_id: Uuid) -> Result<Option<UserSummary>, StorageError> {
        if let Some(cached) = self.cache.get(&user_id) {
            return Ok(cached.clone());
        }
        let summary = self
            .storage
            .get_user(user_id)
            .await?
            .map(|user| UserSummary::from(&user));
        self.cache.insert(user_id, summary.clone());
        Ok(summary)
    }

    pub(crate) async fn optional(
        &mut self,
        user_id: Option<Uuid>,
    ) -> Result<Option<UserSummary>, StorageError> {
        match user_id {
            Some(id) => self.summary(id).await,
            None => Ok(None),
        }
    }
}
