// Profile service: reads and completes the onboarding profile
// Decision: A role is chosen once. Students pick their own; advisor and
// coordinator need an email on the staff allow-list.

use anyhow::Result;
use std::sync::Arc;
use thesis_portal_core::{Profile, Role};
use uuid::Uuid;

use crate::api::profile::UpdateProfileRequest;
use crate::storage::{models::UpdateProfile, StorageBackend};

/// Why a profile update was refused
#[derive(Debug, thiserror::Error)]
pub enum ProfileUpdateError {
    #[error("Role is already set to {} and cannot be changed", .current.as_str())]
    RoleLocked { current: Role },
    #[error("The {} role is assigned by the thesis office", .0.as_str())]
    RoleNotAllowed(Role),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct ProfileService {
    db: Arc<StorageBackend>,
    /// Lowercased emails allowed to take a staff role
    staff_emails: Vec<String>,
}

impl ProfileService {
    pub fn new(db: Arc<StorageBackend>, staff_emails: Vec<String>) -> Self {
        Self { db, staff_emails }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row = self.db.get_profile(user_id).await?;
        Ok(row.map(|r| r.into_profile()))
    }

    fn may_choose(&self, role: Role, email: &str) -> bool {
        match role {
            Role::Student => true,
            Role::Advisor | Role::Coordinator => {
                let email = email.trim().to_lowercase();
                self.staff_emails.iter().any(|staff| *staff == email)
            }
        }
    }

    /// Apply the provided fields. The store keeps the first role it sees and
    /// derives `setup_completed` from the merged row.
    pub async fn update(
        &self,
        user_id: Uuid,
        email: &str,
        req: UpdateProfileRequest,
    ) -> Result<Profile, ProfileUpdateError> {
        if let Some(role) = req.role {
            let current = self.get(user_id).await?.and_then(|p| p.role);
            match current {
                Some(current) if current != role => {
                    return Err(ProfileUpdateError::RoleLocked { current })
                }
                Some(_) => {}
                None if !self.may_choose(role, email) => {
                    tracing::warn!(user_id = %user_id, role = role.as_str(), "Refused staff role");
                    return Err(ProfileUpdateError::RoleNotAllowed(role));
                }
                None => {}
            }
        }

        let trim = |value: Option<String>| value.map(|s| s.trim().to_string());
        let profile = self
            .db
            .upsert_profile(
                user_id,
                UpdateProfile {
                    full_name: trim(req.full_name),
                    national_id: trim(req.national_id),
                    enrollment_code: trim(req.enrollment_code),
                    role: req.role.map(|r| r.as_str().to_string()),
                },
            )
            .await?
            .into_profile();

        // A concurrent update may have stored a different role first
        if let (Some(requested), Some(stored)) = (req.role, profile.role) {
            if requested != stored {
                return Err(ProfileUpdateError::RoleLocked { current: stored });
            }
        }

        tracing::info!(
            user_id = %user_id,
            setup_completed = profile.setup_completed,
            "Profile updated"
        );

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::CreateUserRow;

    const STAFF: &str = "luis@uni.edu";

    async fn setup(email: &str) -> (ProfileService, Uuid) {
        let db = Arc::new(StorageBackend::in_memory());
        let user = db
            .create_user(CreateUserRow {
                email: email.to_string(),
                name: "Test".to_string(),
                avatar_url: None,
                password_hash: None,
                auth_provider: None,
                auth_provider_id: None,
            })
            .await
            .unwrap();
        db.create_profile(user.id).await.unwrap();
        (ProfileService::new(db, vec![STAFF.to_string()]), user.id)
    }

    #[tokio::test]
    async fn test_update_completes_setup_once_required_fields_present() {
        let (service, user_id) = setup("ana@uni.edu").await;

        let profile = service
            .update(
                user_id,
                "ana@uni.edu",
                UpdateProfileRequest {
                    role: Some(Role::Student),
                    national_id: Some("0102030405".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!profile.setup_completed);

        let profile = service
            .update(
                user_id,
                "ana@uni.edu",
                UpdateProfileRequest {
                    enrollment_code: Some(" 2020-1234 ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(profile.setup_completed);
        assert_eq!(profile.enrollment_code.as_deref(), Some("2020-1234"));
        assert_eq!(profile.national_id.as_deref(), Some("0102030405"));
    }

    #[tokio::test]
    async fn test_clearing_a_field_reopens_onboarding() {
        let (service, user_id) = setup(STAFF).await;

        service
            .update(
                user_id,
                STAFF,
                UpdateProfileRequest {
                    role: Some(Role::Coordinator),
                    full_name: Some("Luis Paredes".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profile = service
            .update(
                user_id,
                STAFF,
                UpdateProfileRequest {
                    full_name: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!profile.setup_completed);
    }

    #[tokio::test]
    async fn test_role_cannot_change_once_set() {
        let (service, user_id) = setup(STAFF).await;
        let student = UpdateProfileRequest {
            role: Some(Role::Student),
            ..Default::default()
        };
        service.update(user_id, STAFF, student.clone()).await.unwrap();

        // Resending the same role is fine
        service.update(user_id, STAFF, student).await.unwrap();

        let result = service
            .update(
                user_id,
                STAFF,
                UpdateProfileRequest {
                    role: Some(Role::Coordinator),
                    full_name: Some("Luis Paredes".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(ProfileUpdateError::RoleLocked {
                current: Role::Student
            })
        ));
        let profile = service.get(user_id).await.unwrap().unwrap();
        assert_eq!(profile.role, Some(Role::Student));
        assert!(profile.full_name.is_none());
    }

    #[tokio::test]
    async fn test_staff_roles_need_allow_listed_email() {
        let (service, user_id) = setup("ana@uni.edu").await;

        for role in [Role::Advisor, Role::Coordinator] {
            let result = service
                .update(
                    user_id,
                    "ana@uni.edu",
                    UpdateProfileRequest {
                        role: Some(role),
                        ..Default::default()
                    },
                )
                .await;
            assert!(matches!(result, Err(ProfileUpdateError::RoleNotAllowed(r)) if r == role));
        }

        let (service, user_id) = setup(STAFF).await;
        let profile = service
            .update(
                user_id,
                " Luis@Uni.edu ",
                UpdateProfileRequest {
                    role: Some(Role::Advisor),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.role, Some(Role::Advisor));
    }
}
