// Profile API routes
// Decision: The dashboard's onboarding form reads and completes the profile here

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thesis_portal_core::{onboarding_missing, Profile, ProfileField, ProfileView, Role};
use utoipa::ToSchema;

use super::common::{ApiError, ErrorResponse};
use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::services::{ProfileService, ProfileUpdateError};

/// App state for profile routes
#[derive(Clone)]
pub struct ProfileState {
    pub service: Arc<ProfileService>,
    pub auth: AuthState,
}

impl ProfileState {
    pub fn new(auth: AuthState, staff_emails: Vec<String>) -> Self {
        Self {
            service: Arc::new(ProfileService::new(auth.db.clone(), staff_emails)),
            auth,
        }
    }
}

impl FromRef<ProfileState> for AuthState {
    fn from_ref(input: &ProfileState) -> Self {
        input.auth.clone()
    }
}

/// Profile fields to set. Omitted fields keep their value; a blank string clears one.
/// The role can only be chosen while none is set.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub enrollment_code: Option<String>,
    pub role: Option<Role>,
}

/// Profile plus what onboarding still needs
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub profile: ProfileView,
    /// Fields still required before the role page opens
    pub missing_fields: Vec<ProfileField>,
    /// Role landing page, once onboarding is done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
}

impl ProfileResponse {
    pub fn from_view(profile: ProfileView) -> Self {
        let missing_fields = onboarding_missing(&profile);
        let home = match profile.role {
            Some(role) if missing_fields.is_empty() => Some(role.home_path().to_string()),
            _ => None,
        };
        Self {
            profile,
            missing_fields,
            home,
        }
    }

    fn from_profile(profile: &Profile, user: &AuthUser) -> Self {
        Self::from_view(profile.normalize(&user.email))
    }
}

/// Create profile routes
pub fn routes(state: ProfileState) -> Router {
    Router::new()
        .route("/api/profile", get(get_profile).put(update_profile))
        .with_state(state)
}

/// GET /api/profile - Current user's profile
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "profile"
)]
pub async fn get_profile(
    State(state): State<ProfileState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .service
        .get(user.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get profile: {}", e);
            ApiError::internal("Failed to get profile")
        })?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(ProfileResponse::from_profile(&profile, &user)))
}

/// PUT /api/profile - Fill in onboarding fields
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Role already set or reserved for staff", body = ErrorResponse),
        (status = 422, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "profile"
)]
pub async fn update_profile(
    State(state): State<ProfileState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let too_long = [&req.full_name, &req.national_id, &req.enrollment_code]
        .into_iter()
        .flatten()
        .any(|value| value.chars().count() > 200);
    if too_long {
        return Err(ApiError::unprocessable(
            "Profile fields must be at most 200 characters",
        ));
    }

    let profile = match state.service.update(user.id, &user.email, req).await {
        Ok(profile) => profile,
        Err(ProfileUpdateError::Storage(e)) => {
            tracing::error!("Failed to update profile: {}", e);
            return Err(ApiError::internal("Failed to update profile"));
        }
        Err(e) => return Err(ApiError::forbidden(e.to_string())),
    };

    Ok(Json(ProfileResponse::from_profile(&profile, &user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_update_request_rejects_unknown_role() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"role": "advisor", "full_name": "Eva"}"#).unwrap();
        assert_eq!(req.role, Some(Role::Advisor));

        assert!(serde_json::from_str::<UpdateProfileRequest>(r#"{"role": "dean"}"#).is_err());
    }

    #[test]
    fn test_response_points_home_only_when_complete() {
        let incomplete = Profile {
            role: Some(Role::Advisor),
            full_name: Some("Eva Ruiz".to_string()),
            ..Profile::empty(Uuid::nil())
        };
        let response = ProfileResponse::from_view(incomplete.normalize("eva@uni.edu"));
        assert_eq!(response.missing_fields, vec![ProfileField::NationalId]);
        assert!(response.home.is_none());

        let complete = Profile {
            national_id: Some("0911223344".to_string()),
            ..incomplete
        };
        let response = ProfileResponse::from_view(complete.normalize("eva@uni.edu"));
        assert!(response.missing_fields.is_empty());
        assert_eq!(response.home.as_deref(), Some("/advisor"));
    }
}
