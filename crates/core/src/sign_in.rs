// Sign-in options
//
// Decision: The "user just logged out" flag is an explicit LogoutHint passed
// into the sign-in call, never read from ambient storage. The caller is told
// whether to clear its stored flag.
// Decision: Google gets prompt=select_account after a logout so the account
// chooser shows instead of silently reusing the previous Google account.

use serde::{Deserialize, Serialize};
use url::Url;

/// Fixed callback path; the provider name is appended as the last segment
pub const CALLBACK_PATH: &str = "/auth/callback";

/// OAuth provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    GitHub,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::GitHub => "github",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "google" => Some(OAuthProvider::Google),
            "github" => Some(OAuthProvider::GitHub),
            _ => None,
        }
    }
}

/// Evidence of a sign-out just before this sign-in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogoutHint {
    /// `logout=true` was present in the URL
    pub from_url: bool,
    /// The stored flag set at sign-out
    pub from_stored_flag: bool,
}

impl LogoutHint {
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from the raw `logout` query value and the stored flag
    pub fn from_sources(logout_param: Option<&str>, stored_flag: bool) -> Self {
        let from_url = logout_param
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);
        Self {
            from_url,
            from_stored_flag: stored_flag,
        }
    }

    pub fn detected(&self) -> bool {
        self.from_url || self.from_stored_flag
    }
}

/// Options attached to a provider sign-in call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOptions {
    pub provider: OAuthProvider,
    /// Where the provider sends the user back
    pub redirect_to: String,
    /// Extra provider query parameters
    pub query_params: Vec<(String, String)>,
    /// The caller must clear its stored logout flag after this call
    pub clear_logout_flag: bool,
}

impl SignInOptions {
    /// Options for an OAuth sign-in from `origin`
    pub fn for_oauth(origin: &str, provider: OAuthProvider, hint: LogoutHint) -> Self {
        let mut query_params = Vec::new();
        if provider == OAuthProvider::Google && hint.detected() {
            query_params.push(("prompt".to_string(), "select_account".to_string()));
        }

        Self {
            provider,
            redirect_to: callback_url(origin, provider),
            query_params,
            clear_logout_flag: hint.detected(),
        }
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append the provider query parameters to an authorization URL
    pub fn apply_to(&self, url: &mut Url) {
        if self.query_params.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &self.query_params {
            pairs.append_pair(key, value);
        }
    }
}

/// Callback URL: origin + fixed callback path + provider
pub fn callback_url(origin: &str, provider: OAuthProvider) -> String {
    format!(
        "{}{}/{}",
        origin.trim_end_matches('/'),
        CALLBACK_PATH,
        provider.as_str()
    )
}
