// OpenAPI specification generation
//
// Used by the server (Swagger UI) and the export-openapi binary.

use crate::api;
use crate::api::{ErrorResponse, ListResponse};
use crate::auth::routes as auth_routes;
use thesis_portal_core::{ProfileField, ProfileView, Role};
use utoipa::OpenApi;

/// OpenAPI documentation for the Thesis Portal API
#[derive(OpenApi)]
#[openapi(
    paths(
        auth_routes::get_auth_config,
        auth_routes::login,
        auth_routes::register,
        auth_routes::logout,
        auth_routes::get_session,
        api::profile::get_profile,
        api::profile::update_profile,
        api::uploads::upload_thesis,
        api::uploads::list_uploads,
    ),
    components(
        schemas(
            ErrorResponse,
            Role, ProfileField, ProfileView,
            auth_routes::LoginRequest, auth_routes::RegisterRequest,
            auth_routes::TokenResponse, auth_routes::AuthConfigResponse,
            auth_routes::SessionInfo, auth_routes::SessionResponse,
            api::profile::UpdateProfileRequest, api::profile::ProfileResponse,
            api::pages::EntryPage, api::pages::DashboardPage, api::pages::RolePage,
            api::uploads::ThesisSubmission, api::uploads::ThesisUploadForm,
            ListResponse<api::uploads::ThesisSubmission>,
        )
    ),
    tags(
        (name = "auth", description = "Sign-in, sign-up and session endpoints"),
        (name = "profile", description = "Onboarding profile endpoints"),
        (name = "uploads", description = "Thesis document uploads")
    ),
    info(
        title = "Thesis Portal API",
        version = "0.1.0",
        description = "API for thesis portal sign-in, onboarding profiles and thesis uploads",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_routes() {
        let json = ApiDoc::to_json().unwrap();
        assert!(json.contains("/api/uploads/thesis"));
        assert!(json.contains("/api/profile"));
        assert!(json.contains("/auth/login"));
        assert!(json.contains("ThesisSubmission"));
    }
}
