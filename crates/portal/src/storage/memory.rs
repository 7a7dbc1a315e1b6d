// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation mirrors the PostgreSQL repository API backed by
// HashMaps, so the portal runs without a database during development and tests.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<HashMap<Uuid, UserRow>>,
    profiles: RwLock<HashMap<Uuid, ProfileRow>>,
    submissions: RwLock<HashMap<Uuid, SubmissionRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let mut users = self.users.write();
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(anyhow!("User with email {} already exists", input.email));
        }

        let now = Self::now();
        let id = Uuid::now_v7();
        let row = UserRow {
            id,
            email: input.email,
            name: input.name,
            avatar_url: input.avatar_url,
            password_hash: input.password_hash,
            auth_provider: input.auth_provider,
            auth_provider_id: input.auth_provider_id,
            created_at: now,
            updated_at: now,
        };
        users.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    pub async fn get_user_by_oauth(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| {
                u.auth_provider.as_deref() == Some(provider)
                    && u.auth_provider_id.as_deref() == Some(provider_id)
            })
            .cloned())
    }

    // ============================================
    // Profiles
    // ============================================

    pub async fn create_profile(&self, user_id: Uuid) -> Result<ProfileRow> {
        let now = Self::now();
        let row = self
            .profiles
            .write()
            .entry(user_id)
            .or_insert_with(|| ProfileRow {
                user_id,
                full_name: None,
                national_id: None,
                enrollment_code: None,
                role: None,
                setup_completed: false,
                created_at: now,
                updated_at: now,
            })
            .clone();
        Ok(row)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        Ok(self.profiles.read().get(&user_id).cloned())
    }

    pub async fn upsert_profile(&self, user_id: Uuid, input: UpdateProfile) -> Result<ProfileRow> {
        if !self.users.read().contains_key(&user_id) {
            return Err(anyhow!("User {} not found", user_id));
        }

        let now = Self::now();
        let mut profiles = self.profiles.write();
        let profile = profiles.entry(user_id).or_insert_with(|| ProfileRow {
            user_id,
            full_name: None,
            national_id: None,
            enrollment_code: None,
            role: None,
            setup_completed: false,
            created_at: now,
            updated_at: now,
        });

        if let Some(full_name) = input.full_name {
            profile.full_name = Some(full_name);
        }
        if let Some(national_id) = input.national_id {
            profile.national_id = Some(national_id);
        }
        if let Some(enrollment_code) = input.enrollment_code {
            profile.enrollment_code = Some(enrollment_code);
        }
        if profile.role.is_none() {
            profile.role = input.role;
        }
        // Recomputed under the same write lock as the merge
        profile.setup_completed = profile.onboarding_complete();
        profile.updated_at = now;

        Ok(profile.clone())
    }

    // ============================================
    // Thesis submissions
    // ============================================

    pub async fn create_submission(&self, input: CreateSubmissionRow) -> Result<SubmissionRow> {
        let id = Uuid::now_v7();
        let row = SubmissionRow {
            id,
            user_id: input.user_id,
            file_name: input.file_name,
            mime_type: input.mime_type,
            size_bytes: input.size_bytes,
            created_at: Self::now(),
        };
        self.submissions.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn list_submissions_for_user(&self, user_id: Uuid) -> Result<Vec<SubmissionRow>> {
        let submissions = self.submissions.read();
        let mut result: Vec<_> = submissions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        // v7 ids are time-ordered, so they break created_at ties
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }
}
