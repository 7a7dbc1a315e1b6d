// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thesis_portal_core::{onboarding_missing, Profile, Role};
use uuid::Uuid;

// ============================================
// Accounts (identity provider side)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub password_hash: Option<String>,
    pub auth_provider: Option<String>,
    pub auth_provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserRow {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub password_hash: Option<String>,
    pub auth_provider: Option<String>,
    pub auth_provider_id: Option<String>,
}

// ============================================
// Profiles (application side, keyed by user id)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub enrollment_code: Option<String>,
    pub role: Option<String>,
    pub setup_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    /// Unknown role strings are read as "no role yet"
    pub fn into_profile(self) -> Profile {
        Profile {
            user_id: self.user_id,
            full_name: self.full_name,
            national_id: self.national_id,
            enrollment_code: self.enrollment_code,
            role: self.role.as_deref().and_then(Role::from_str),
            setup_completed: self.setup_completed,
            updated_at: self.updated_at,
        }
    }

    /// A role plus every field that role's page requires
    pub fn onboarding_complete(&self) -> bool {
        onboarding_missing(&self.clone().into_profile().normalize("")).is_empty()
    }
}

/// Partial profile update. Only provided fields change; a role is only
/// written while none is stored. `setup_completed` is derived by the store.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub enrollment_code: Option<String>,
    pub role: Option<String>,
}

// ============================================
// Thesis submissions
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSubmissionRow {
    pub user_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
}
