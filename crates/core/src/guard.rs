// Session guard
//
// Decision: One parametrized check for every protected page. A page passes a
// GuardPolicy (required fields, fallback target) instead of repeating the
// session/profile lookups itself.
// Decision: Fail safe. A profile lookup failure sends the user to the
// dashboard, a session lookup failure to the entry page. Never fail open.
// Decision: No retries and no caching; every page load re-runs the check.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::profile::{Profile, ProfileField, ProfileView, Role};
use crate::session::Session;
use crate::{DASHBOARD_PATH, ENTRY_PATH};

/// Identity provider side of the guard: "get current session"
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Returns the active session, or None when there is no valid one.
    async fn current_session(&self) -> Result<Option<Session>, ProviderError>;
}

/// Profile store side of the guard: one row keyed by the session user id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, ProviderError>;
}

/// What a protected page requires before it renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    /// Page name, used in logs
    pub page: String,
    pub required_fields: Vec<ProfileField>,
    /// Role the profile must carry, if any
    pub required_role: Option<Role>,
    /// Where incomplete profiles and profile lookup failures go
    pub fallback_redirect: String,
    /// Where visitors without a session go
    pub entry_redirect: String,
    /// A missing or unreadable profile row reads as an empty profile instead
    /// of a redirect
    pub profile_optional: bool,
}

impl GuardPolicy {
    pub fn new(page: impl Into<String>, required_fields: Vec<ProfileField>) -> Self {
        Self {
            page: page.into(),
            required_fields,
            required_role: None,
            fallback_redirect: DASHBOARD_PATH.to_string(),
            entry_redirect: ENTRY_PATH.to_string(),
            profile_optional: false,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }

    pub fn with_fallback(mut self, target: impl Into<String>) -> Self {
        self.fallback_redirect = target.into();
        self
    }

    /// Onboarding dashboard: any session will do. It is also the fallback
    /// target, so it never redirects a signed-in user to itself; without a
    /// readable profile it renders the empty onboarding view.
    pub fn dashboard() -> Self {
        Self {
            profile_optional: true,
            ..Self::new("dashboard", Vec::new())
        }
    }

    pub fn student() -> Self {
        Self::new(
            "student",
            vec![ProfileField::NationalId, ProfileField::EnrollmentCode],
        )
        .with_role(Role::Student)
    }

    pub fn advisor() -> Self {
        Self::new(
            "advisor",
            vec![ProfileField::FullName, ProfileField::NationalId],
        )
        .with_role(Role::Advisor)
    }

    pub fn coordinator() -> Self {
        Self::new("coordinator", vec![ProfileField::FullName]).with_role(Role::Coordinator)
    }

    /// Policy guarding a role's home page
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Student => Self::student(),
            Role::Advisor => Self::advisor(),
            Role::Coordinator => Self::coordinator(),
        }
    }
}

/// Fields the user still has to fill in on the dashboard before their role
/// page opens. Without a role, only the role itself is reported.
pub fn onboarding_missing(view: &ProfileView) -> Vec<ProfileField> {
    match view.role {
        None => vec![ProfileField::Role],
        Some(role) => GuardPolicy::for_role(role)
            .required_fields
            .into_iter()
            .filter(|field| !view.has(*field))
            .collect(),
    }
}

/// Why the guard redirected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReason {
    NoSession,
    SessionLookupFailed,
    ProfileLookupFailed,
    ProfileMissing,
    IncompleteProfile(Vec<ProfileField>),
    RoleMismatch {
        required: Role,
        actual: Option<Role>,
    },
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::NoSession => "no_session",
            RedirectReason::SessionLookupFailed => "session_lookup_failed",
            RedirectReason::ProfileLookupFailed => "profile_lookup_failed",
            RedirectReason::ProfileMissing => "profile_missing",
            RedirectReason::IncompleteProfile(_) => "incomplete_profile",
            RedirectReason::RoleMismatch { .. } => "role_mismatch",
        }
    }
}

/// Terminal result of one guard run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Authorized(ProfileView),
    Redirect { to: String, reason: RedirectReason },
}

impl GuardOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GuardOutcome::Authorized(_))
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardOutcome::Redirect { to, .. } => Some(to),
            GuardOutcome::Authorized(_) => None,
        }
    }
}

/// Per-page-load guard state. Starts in Checking and settles exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GuardState {
    #[default]
    Checking,
    Authorized(ProfileView),
    Redirecting { to: String, reason: RedirectReason },
}

impl GuardState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, GuardState::Checking)
    }

    /// Settle a Checking state with the guard's outcome. A settled state is
    /// left untouched.
    pub fn settle(self, outcome: GuardOutcome) -> Self {
        match self {
            GuardState::Checking => outcome.into(),
            settled => settled,
        }
    }
}

impl From<GuardOutcome> for GuardState {
    fn from(outcome: GuardOutcome) -> Self {
        match outcome {
            GuardOutcome::Authorized(view) => GuardState::Authorized(view),
            GuardOutcome::Redirect { to, reason } => GuardState::Redirecting { to, reason },
        }
    }
}

/// Runs the session → profile → completeness check for one page load
pub struct SessionGuard<'a> {
    sessions: &'a dyn SessionSource,
    profiles: &'a dyn ProfileStore,
}

impl<'a> SessionGuard<'a> {
    pub fn new(sessions: &'a dyn SessionSource, profiles: &'a dyn ProfileStore) -> Self {
        Self { sessions, profiles }
    }

    /// Run the check. Lookups are awaited sequentially: session first, then
    /// the profile keyed by the session user id.
    pub async fn check(&self, policy: &GuardPolicy) -> GuardOutcome {
        let session = match self.sessions.current_session().await {
            Ok(Some(session)) if !session.is_expired() => session,
            Ok(Some(session)) => {
                tracing::debug!(page = %policy.page, user_id = %session.user_id, "Session expired");
                return redirect(&policy.entry_redirect, RedirectReason::NoSession, policy);
            }
            Ok(None) => {
                return redirect(&policy.entry_redirect, RedirectReason::NoSession, policy);
            }
            Err(e) => {
                tracing::error!(page = %policy.page, "Session lookup failed: {}", e);
                return redirect(
                    &policy.entry_redirect,
                    RedirectReason::SessionLookupFailed,
                    policy,
                );
            }
        };

        let profile = match self.profiles.fetch_profile(session.user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) if policy.profile_optional => Profile::empty(session.user_id),
            Ok(None) => {
                return redirect(
                    &policy.fallback_redirect,
                    RedirectReason::ProfileMissing,
                    policy,
                );
            }
            Err(e) if policy.profile_optional => {
                tracing::error!(
                    page = %policy.page,
                    user_id = %session.user_id,
                    "Profile lookup failed, rendering without profile: {}",
                    e
                );
                Profile::empty(session.user_id)
            }
            Err(e) => {
                tracing::error!(
                    page = %policy.page,
                    user_id = %session.user_id,
                    "Profile lookup failed: {}",
                    e
                );
                return redirect(
                    &policy.fallback_redirect,
                    RedirectReason::ProfileLookupFailed,
                    policy,
                );
            }
        };

        if let Some(required) = policy.required_role {
            if profile.role != Some(required) {
                return redirect(
                    &policy.fallback_redirect,
                    RedirectReason::RoleMismatch {
                        required,
                        actual: profile.role,
                    },
                    policy,
                );
            }
        }

        let missing = profile.missing_fields(&policy.required_fields);
        if !missing.is_empty() {
            return redirect(
                &policy.fallback_redirect,
                RedirectReason::IncompleteProfile(missing),
                policy,
            );
        }

        tracing::debug!(page = %policy.page, user_id = %session.user_id, "Access granted");
        GuardOutcome::Authorized(profile.normalize(&session.email))
    }

    /// Run the check from a fresh Checking state
    pub async fn run(&self, policy: &GuardPolicy) -> GuardState {
        GuardState::Checking.settle(self.check(policy).await)
    }
}

fn redirect(to: &str, reason: RedirectReason, policy: &GuardPolicy) -> GuardOutcome {
    tracing::debug!(
        page = %policy.page,
        to = %to,
        reason = reason.as_str(),
        "Guard redirecting"
    );
    GuardOutcome::Redirect {
        to: to.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    enum FakeSessions {
        Active(Session),
        Missing,
        Broken,
    }

    #[async_trait]
    impl SessionSource for FakeSessions {
        async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
            match self {
                FakeSessions::Active(session) => Ok(Some(session.clone())),
                FakeSessions::Missing => Ok(None),
                FakeSessions::Broken => Err(ProviderError::unavailable("provider down")),
            }
        }
    }

    enum FakeProfiles {
        Found(Profile),
        Missing,
        Broken,
    }

    #[async_trait]
    impl ProfileStore for FakeProfiles {
        async fn fetch_profile(&self, _user_id: Uuid) -> Result<Option<Profile>, ProviderError> {
            match self {
                FakeProfiles::Found(profile) => Ok(Some(profile.clone())),
                FakeProfiles::Missing => Ok(None),
                FakeProfiles::Broken => Err(ProviderError::unavailable("store down")),
            }
        }
    }

    fn user_id() -> Uuid {
        Uuid::from_u128(42)
    }

    fn session() -> Session {
        let now = Utc::now();
        Session {
            user_id: user_id(),
            email: "ana@uni.edu".to_string(),
            name: "Ana".to_string(),
            issued_at: now,
            expires_at: now + Duration::minutes(15),
        }
    }

    fn complete_profile(role: Role) -> Profile {
        Profile {
            full_name: Some("Ana Torres".to_string()),
            national_id: Some("0102030405".to_string()),
            enrollment_code: Some("2020-1234".to_string()),
            role: Some(role),
            setup_completed: true,
            ..Profile::empty(user_id())
        }
    }

    fn all_policies() -> Vec<GuardPolicy> {
        vec![
            GuardPolicy::dashboard(),
            GuardPolicy::student(),
            GuardPolicy::advisor(),
            GuardPolicy::coordinator(),
        ]
    }

    #[tokio::test]
    async fn test_no_session_redirects_to_entry_on_every_page() {
        let sessions = FakeSessions::Missing;
        let profiles = FakeProfiles::Found(complete_profile(Role::Student));
        let guard = SessionGuard::new(&sessions, &profiles);

        for policy in all_policies() {
            let outcome = guard.check(&policy).await;
            assert_eq!(
                outcome,
                GuardOutcome::Redirect {
                    to: ENTRY_PATH.to_string(),
                    reason: RedirectReason::NoSession,
                },
                "page {}",
                policy.page
            );
        }
    }

    #[tokio::test]
    async fn test_expired_session_counts_as_no_session() {
        let mut expired = session();
        expired.expires_at = Utc::now() - Duration::seconds(1);
        let sessions = FakeSessions::Active(expired);
        let profiles = FakeProfiles::Found(complete_profile(Role::Student));

        let outcome = SessionGuard::new(&sessions, &profiles)
            .check(&GuardPolicy::student())
            .await;
        assert_eq!(outcome.redirect_target(), Some(ENTRY_PATH));
    }

    #[tokio::test]
    async fn test_session_lookup_failure_redirects_to_entry() {
        let sessions = FakeSessions::Broken;
        let profiles = FakeProfiles::Found(complete_profile(Role::Student));

        let outcome = SessionGuard::new(&sessions, &profiles)
            .check(&GuardPolicy::dashboard())
            .await;
        assert_eq!(
            outcome,
            GuardOutcome::Redirect {
                to: ENTRY_PATH.to_string(),
                reason: RedirectReason::SessionLookupFailed,
            }
        );
    }

    #[tokio::test]
    async fn test_profile_error_redirects_to_dashboard_never_entry() {
        let sessions = FakeSessions::Active(session());
        let profiles = FakeProfiles::Broken;
        let guard = SessionGuard::new(&sessions, &profiles);

        for policy in all_policies().into_iter().filter(|p| !p.profile_optional) {
            let outcome = guard.check(&policy).await;
            assert_eq!(
                outcome,
                GuardOutcome::Redirect {
                    to: DASHBOARD_PATH.to_string(),
                    reason: RedirectReason::ProfileLookupFailed,
                },
                "page {}",
                policy.page
            );
        }
    }

    #[tokio::test]
    async fn test_dashboard_with_broken_store_does_not_redirect_to_itself() {
        let sessions = FakeSessions::Active(session());
        let profiles = FakeProfiles::Broken;
        let guard = SessionGuard::new(&sessions, &profiles);

        match guard.run(&GuardPolicy::dashboard()).await {
            GuardState::Authorized(view) => {
                assert_eq!(view.user_id, user_id());
                assert_eq!(onboarding_missing(&view), vec![ProfileField::Role]);
            }
            other => panic!("expected degraded dashboard, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_student_missing_national_id_or_enrollment_code() {
        let sessions = FakeSessions::Active(session());

        let mut no_id = complete_profile(Role::Student);
        no_id.national_id = None;
        let mut no_code = complete_profile(Role::Student);
        no_code.enrollment_code = Some(String::new());

        for (profile, missing) in [
            (no_id, ProfileField::NationalId),
            (no_code, ProfileField::EnrollmentCode),
        ] {
            let profiles = FakeProfiles::Found(profile);
            let outcome = SessionGuard::new(&sessions, &profiles)
                .check(&GuardPolicy::student())
                .await;
            assert_eq!(
                outcome,
                GuardOutcome::Redirect {
                    to: DASHBOARD_PATH.to_string(),
                    reason: RedirectReason::IncompleteProfile(vec![missing]),
                }
            );
        }
    }

    #[tokio::test]
    async fn test_missing_profile_row_redirects_to_fallback() {
        let sessions = FakeSessions::Active(session());
        let profiles = FakeProfiles::Missing;

        let policy = GuardPolicy::student().with_fallback("/onboarding");
        let outcome = SessionGuard::new(&sessions, &profiles).check(&policy).await;
        assert_eq!(
            outcome,
            GuardOutcome::Redirect {
                to: "/onboarding".to_string(),
                reason: RedirectReason::ProfileMissing,
            }
        );
    }

    #[tokio::test]
    async fn test_role_mismatch_redirects_to_dashboard() {
        let sessions = FakeSessions::Active(session());
        let profiles = FakeProfiles::Found(complete_profile(Role::Student));

        let outcome = SessionGuard::new(&sessions, &profiles)
            .check(&GuardPolicy::coordinator())
            .await;
        assert_eq!(
            outcome,
            GuardOutcome::Redirect {
                to: DASHBOARD_PATH.to_string(),
                reason: RedirectReason::RoleMismatch {
                    required: Role::Coordinator,
                    actual: Some(Role::Student),
                },
            }
        );
    }

    #[tokio::test]
    async fn test_complete_profile_is_authorized_with_normalized_view() {
        let sessions = FakeSessions::Active(session());
        let mut profile = complete_profile(Role::Student);
        profile.full_name = Some(" Ana Torres  ".to_string());
        let profiles = FakeProfiles::Found(profile);

        let state = SessionGuard::new(&sessions, &profiles)
            .run(&GuardPolicy::student())
            .await;

        match state {
            GuardState::Authorized(view) => {
                assert_eq!(view.user_id, user_id());
                assert_eq!(view.email, "ana@uni.edu");
                assert_eq!(view.full_name.as_deref(), Some("Ana Torres"));
                assert_eq!(view.role, Some(Role::Student));
            }
            other => panic!("expected authorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dashboard_accepts_empty_profile() {
        let sessions = FakeSessions::Active(session());
        let profiles = FakeProfiles::Found(Profile::empty(user_id()));

        let outcome = SessionGuard::new(&sessions, &profiles)
            .check(&GuardPolicy::dashboard())
            .await;
        assert!(outcome.is_authorized());
    }

    #[test]
    fn test_guard_state_settles_once() {
        let state = GuardState::default();
        assert!(!state.is_settled());

        let redirected = state.settle(GuardOutcome::Redirect {
            to: ENTRY_PATH.to_string(),
            reason: RedirectReason::NoSession,
        });
        assert!(redirected.is_settled());

        let view = Profile::empty(user_id()).normalize("ana@uni.edu");
        let unchanged = redirected.clone().settle(GuardOutcome::Authorized(view));
        assert_eq!(unchanged, redirected);
    }

    #[test]
    fn test_for_role_policies() {
        assert_eq!(GuardPolicy::for_role(Role::Student), GuardPolicy::student());
        assert_eq!(
            GuardPolicy::student().required_fields,
            vec![ProfileField::NationalId, ProfileField::EnrollmentCode]
        );
        assert_eq!(GuardPolicy::dashboard().required_role, None);
    }

    #[test]
    fn test_onboarding_missing_follows_role_policy() {
        let no_role = Profile::empty(user_id()).normalize("ana@uni.edu");
        assert_eq!(onboarding_missing(&no_role), vec![ProfileField::Role]);

        let student = Profile {
            role: Some(Role::Student),
            national_id: Some("0102030405".to_string()),
            enrollment_code: Some("  ".to_string()),
            ..Profile::empty(user_id())
        }
        .normalize("ana@uni.edu");
        assert_eq!(
            onboarding_missing(&student),
            vec![ProfileField::EnrollmentCode]
        );

        let coordinator = complete_profile(Role::Coordinator).normalize("ana@uni.edu");
        assert!(onboarding_missing(&coordinator).is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_renders_without_profile_row() {
        let sessions = FakeSessions::Active(session());
        let profiles = FakeProfiles::Missing;
        let guard = SessionGuard::new(&sessions, &profiles);

        match guard.check(&GuardPolicy::dashboard()).await {
            GuardOutcome::Authorized(view) => {
                assert_eq!(view.user_id, user_id());
                assert!(view.role.is_none());
            }
            other => panic!("expected dashboard to render, got {:?}", other),
        }
    }
}
