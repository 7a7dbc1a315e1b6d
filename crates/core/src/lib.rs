// Thesis portal access rules
//
// This crate holds the transport-agnostic rules the portal service applies
// to every request:
// - Edge route filter: coarse cookie-name heuristic in front of protected prefixes
// - Session guard: authoritative session + profile check per protected page
// - Upload policy: MIME type and size limits for thesis documents
// - Sign-in options: callback URLs and the post-logout account chooser
//
// Key design decisions:
// - Session and profile lookups go through traits (SessionSource, ProfileStore)
// - One parametrized guard (GuardPolicy) replaces per-page copies of the check
// - The logout hint is an explicit value, never ambient state

pub mod error;
pub mod guard;
pub mod profile;
pub mod route_filter;
pub mod session;
pub mod sign_in;
pub mod upload;

pub use error::ProviderError;
pub use guard::{
    onboarding_missing, GuardOutcome, GuardPolicy, GuardState, ProfileStore, RedirectReason,
    SessionGuard, SessionSource,
};
pub use profile::{Profile, ProfileField, ProfileView, Role};
pub use route_filter::{FilterMode, RouteDecision, RouteFilter};
pub use session::Session;
pub use sign_in::{callback_url, LogoutHint, OAuthProvider, SignInOptions, CALLBACK_PATH};
pub use upload::{SelectedFile, UploadError, UploadForm, UploadPolicy};

/// Entry page for visitors without a session
pub const ENTRY_PATH: &str = "/";

/// Onboarding dashboard, the fallback for incomplete profiles and lookup failures
pub const DASHBOARD_PATH: &str = "/dashboard";
