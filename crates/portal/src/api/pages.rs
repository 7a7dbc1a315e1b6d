// Guarded portal pages
// Decision: Every page runs the same session guard with its own GuardPolicy
// Decision: Guard failures are redirects (303), never error bodies
//
// Pages render JSON page models; the frontend draws them.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thesis_portal_core::{
    GuardPolicy, GuardState, ProfileField, ProfileView, SessionGuard, ENTRY_PATH,
};
use utoipa::ToSchema;

use super::profile::ProfileResponse;
use crate::auth::middleware::AuthState;
use crate::storage::DbProfileStore;

/// App state for page routes
#[derive(Clone)]
pub struct PagesState {
    pub auth: AuthState,
}

/// Entry page: the sign-in options
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntryPage {
    pub oauth_providers: Vec<String>,
    pub signup_enabled: bool,
}

/// Onboarding dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardPage {
    pub profile: ProfileView,
    /// True until the role and its required fields are filled in
    pub onboarding_required: bool,
    pub missing_fields: Vec<ProfileField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
}

/// Role landing page (student, advisor, coordinator)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RolePage {
    pub page: String,
    pub profile: ProfileView,
}

/// Create page routes
pub fn routes(state: PagesState) -> Router {
    Router::new()
        .route(ENTRY_PATH, get(entry_page))
        .route("/dashboard", get(dashboard_page))
        .route("/student", get(student_page))
        .route("/advisor", get(advisor_page))
        .route("/coordinator", get(coordinator_page))
        .with_state(state)
}

/// Run the session guard for one page load
pub async fn render_guarded(
    state: &AuthState,
    headers: &HeaderMap,
    policy: &GuardPolicy,
) -> Result<ProfileView, Redirect> {
    let sessions = state.request_session(headers);
    let profiles = DbProfileStore::new(state.db.clone());
    let guard = SessionGuard::new(&sessions, &profiles);

    match guard.run(policy).await {
        GuardState::Authorized(view) => Ok(view),
        GuardState::Redirecting { to, .. } => Err(Redirect::to(&to)),
        GuardState::Checking => Err(Redirect::to(&policy.entry_redirect)),
    }
}

async fn role_page(state: &PagesState, headers: &HeaderMap, policy: GuardPolicy) -> Response {
    match render_guarded(&state.auth, headers, &policy).await {
        Ok(profile) => Json(RolePage {
            page: policy.page,
            profile,
        })
        .into_response(),
        Err(redirect) => redirect.into_response(),
    }
}

/// GET / - Entry page
pub async fn entry_page(State(state): State<PagesState>) -> Json<EntryPage> {
    Json(EntryPage {
        oauth_providers: state.auth.config.oauth_providers(),
        signup_enabled: !state.auth.config.disable_signup,
    })
}

/// GET /dashboard - Onboarding dashboard, any session
pub async fn dashboard_page(State(state): State<PagesState>, headers: HeaderMap) -> Response {
    match render_guarded(&state.auth, &headers, &GuardPolicy::dashboard()).await {
        Ok(profile) => {
            let ProfileResponse {
                profile,
                missing_fields,
                home,
            } = ProfileResponse::from_view(profile);
            Json(DashboardPage {
                profile,
                onboarding_required: !missing_fields.is_empty(),
                missing_fields,
                home,
            })
            .into_response()
        }
        Err(redirect) => redirect.into_response(),
    }
}

/// GET /student
pub async fn student_page(State(state): State<PagesState>, headers: HeaderMap) -> Response {
    role_page(&state, &headers, GuardPolicy::student()).await
}

/// GET /advisor
pub async fn advisor_page(State(state): State<PagesState>, headers: HeaderMap) -> Response {
    role_page(&state, &headers, GuardPolicy::advisor()).await
}

/// GET /coordinator
pub async fn coordinator_page(State(state): State<PagesState>, headers: HeaderMap) -> Response {
    role_page(&state, &headers, GuardPolicy::coordinator()).await
}
