// ProfileStore implementation over the storage backend
//
// The session guard fetches "one row from profiles where user_id equals the
// session user id" through this adapter.

use async_trait::async_trait;
use std::sync::Arc;
use thesis_portal_core::{Profile, ProfileStore, ProviderError};
use uuid::Uuid;

use super::backend::StorageBackend;

/// Profile store backed by PostgreSQL or the in-memory database
pub struct DbProfileStore {
    db: Arc<StorageBackend>,
}

impl DbProfileStore {
    pub fn new(db: Arc<StorageBackend>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for DbProfileStore {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, ProviderError> {
        self.db
            .get_profile(user_id)
            .await
            .map(|row| row.map(|r| r.into_profile()))
            .map_err(|e| ProviderError::unavailable(e.to_string()))
    }
}
