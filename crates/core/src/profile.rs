// Profile domain types
//
// The profile is the application-level user record, distinct from the
// identity provider's account. It is keyed by the session user id and read
// on every protected-page load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Portal role. Decides which area of the portal a profile belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Advisor,
    Coordinator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Advisor => "advisor",
            Role::Coordinator => "coordinator",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "advisor" => Some(Role::Advisor),
            "coordinator" => Some(Role::Coordinator),
            _ => None,
        }
    }

    /// Landing page of the role's area
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Student => "/student",
            Role::Advisor => "/advisor",
            Role::Coordinator => "/coordinator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity field a page may require before granting access
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    NationalId,
    EnrollmentCode,
    Role,
}

impl ProfileField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::FullName => "full_name",
            ProfileField::NationalId => "national_id",
            ProfileField::EnrollmentCode => "enrollment_code",
            ProfileField::Role => "role",
        }
    }
}

/// Profile record as stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub enrollment_code: Option<String>,
    pub role: Option<Role>,
    /// Set once the user finished the onboarding form on the dashboard
    pub setup_completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile created at sign-up
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            full_name: None,
            national_id: None,
            enrollment_code: None,
            role: None,
            setup_completed: false,
            updated_at: Utc::now(),
        }
    }

    /// Whether the field holds a non-blank value
    pub fn has(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::FullName => non_blank(&self.full_name).is_some(),
            ProfileField::NationalId => non_blank(&self.national_id).is_some(),
            ProfileField::EnrollmentCode => non_blank(&self.enrollment_code).is_some(),
            ProfileField::Role => self.role.is_some(),
        }
    }

    pub fn missing_fields(&self, required: &[ProfileField]) -> Vec<ProfileField> {
        required
            .iter()
            .copied()
            .filter(|field| !self.has(*field))
            .collect()
    }

    /// Normalized view handed to page renderers (trimmed, blanks dropped)
    pub fn normalize(&self, email: &str) -> ProfileView {
        ProfileView {
            user_id: self.user_id,
            email: email.to_string(),
            full_name: non_blank(&self.full_name),
            national_id: non_blank(&self.national_id),
            enrollment_code: non_blank(&self.enrollment_code),
            role: self.role,
            setup_completed: self.setup_completed,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalized profile rendered by guarded pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ProfileView {
    pub user_id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub setup_completed: bool,
}

impl ProfileView {
    pub fn has(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::FullName => self.full_name.is_some(),
            ProfileField::NationalId => self.national_id.is_some(),
            ProfileField::EnrollmentCode => self.enrollment_code.is_some(),
            ProfileField::Role => self.role.is_some(),
        }
    }
}
