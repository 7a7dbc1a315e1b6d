// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(std::sync::Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(std::sync::Arc::new(InMemoryDatabase::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        match self {
            Self::Postgres(db) => db.create_user(input).await,
            Self::InMemory(db) => db.create_user(input).await,
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_email(email).await,
            Self::InMemory(db) => db.get_user_by_email(email).await,
        }
    }

    pub async fn get_user_by_oauth(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_oauth(provider, provider_id).await,
            Self::InMemory(db) => db.get_user_by_oauth(provider, provider_id).await,
        }
    }

    // ============================================
    // Profiles
    // ============================================

    pub async fn create_profile(&self, user_id: Uuid) -> Result<ProfileRow> {
        match self {
            Self::Postgres(db) => db.create_profile(user_id).await,
            Self::InMemory(db) => db.create_profile(user_id).await,
        }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        match self {
            Self::Postgres(db) => db.get_profile(user_id).await,
            Self::InMemory(db) => db.get_profile(user_id).await,
        }
    }

    pub async fn upsert_profile(&self, user_id: Uuid, input: UpdateProfile) -> Result<ProfileRow> {
        match self {
            Self::Postgres(db) => db.upsert_profile(user_id, input).await,
            Self::InMemory(db) => db.upsert_profile(user_id, input).await,
        }
    }

    // ============================================
    // Thesis submissions
    // ============================================

    pub async fn create_submission(&self, input: CreateSubmissionRow) -> Result<SubmissionRow> {
        match self {
            Self::Postgres(db) => db.create_submission(input).await,
            Self::InMemory(db) => db.create_submission(input).await,
        }
    }

    pub async fn list_submissions_for_user(&self, user_id: Uuid) -> Result<Vec<SubmissionRow>> {
        match self {
            Self::Postgres(db) => db.list_submissions_for_user(user_id).await,
            Self::InMemory(db) => db.list_submissions_for_user(user_id).await,
        }
    }
}
