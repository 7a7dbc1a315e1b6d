// Edge route filter
//
// Runs before any page handler. It never validates a credential; it only
// looks at cookie *names* to guess whether a session exists. The session
// guard behind it stays authoritative.
//
// Decision: Enforcement is a mode switch. Advisory mode logs the redirect it
// would have issued and lets the request through.

use crate::ENTRY_PATH;

/// Default cookie-name fragment marking an identity-provider session cookie
pub const DEFAULT_COOKIE_PATTERN: &str = "-auth-token";

/// Whether the filter acts on its decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Redirect protected requests that do not look authenticated
    #[default]
    Enforce,
    /// Log only, always let the request through
    Advisory,
}

impl FilterMode {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "advisory" | "log" | "off" => FilterMode::Advisory,
            _ => FilterMode::Enforce,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Enforce => "enforce",
            FilterMode::Advisory => "advisory",
        }
    }
}

/// Outcome of filtering one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Authentication-flow path, never filtered
    Bypass,
    /// API route, static asset or favicon
    Excluded,
    /// Not under a protected prefix
    Public,
    /// Protected and a session cookie is present
    Allow,
    /// Protected, no session cookie, enforcement on
    Redirect { to: String },
    /// Protected, no session cookie, advisory mode
    WouldRedirect { to: String },
}

impl RouteDecision {
    /// Whether the request continues to the handler
    pub fn lets_through(&self) -> bool {
        !matches!(self, RouteDecision::Redirect { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Bypass => "bypass",
            RouteDecision::Excluded => "excluded",
            RouteDecision::Public => "public",
            RouteDecision::Allow => "allow",
            RouteDecision::Redirect { .. } => "redirect",
            RouteDecision::WouldRedirect { .. } => "would_redirect",
        }
    }
}

/// Static path-prefix matcher plus cookie-name heuristic
#[derive(Debug, Clone)]
pub struct RouteFilter {
    pub mode: FilterMode,
    pub protected_prefixes: Vec<String>,
    /// Authentication-flow prefixes that are never filtered
    pub bypass_prefixes: Vec<String>,
    /// API, static asset and favicon prefixes excluded from filtering
    pub excluded_prefixes: Vec<String>,
    pub cookie_pattern: String,
    pub entry_redirect: String,
}

impl Default for RouteFilter {
    fn default() -> Self {
        Self {
            mode: FilterMode::default(),
            protected_prefixes: ["/dashboard", "/student", "/advisor", "/coordinator"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bypass_prefixes: vec!["/auth".to_string()],
            excluded_prefixes: ["/api", "/static", "/assets", "/favicon.ico"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cookie_pattern: DEFAULT_COOKIE_PATTERN.to_string(),
            entry_redirect: ENTRY_PATH.to_string(),
        }
    }
}

impl RouteFilter {
    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }

    /// Whether any cookie name carries the provider pattern
    pub fn looks_authenticated<'c>(&self, cookie_names: impl IntoIterator<Item = &'c str>) -> bool {
        cookie_names
            .into_iter()
            .any(|name| name.contains(self.cookie_pattern.as_str()))
    }

    pub fn decide<'c>(
        &self,
        path: &str,
        cookie_names: impl IntoIterator<Item = &'c str>,
    ) -> RouteDecision {
        let decision = if self
            .bypass_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
        {
            RouteDecision::Bypass
        } else if self
            .excluded_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
        {
            RouteDecision::Excluded
        } else if !self.is_protected(path) {
            RouteDecision::Public
        } else if self.looks_authenticated(cookie_names) {
            RouteDecision::Allow
        } else {
            let to = self.entry_redirect.clone();
            match self.mode {
                FilterMode::Enforce => RouteDecision::Redirect { to },
                FilterMode::Advisory => RouteDecision::WouldRedirect { to },
            }
        };

        match &decision {
            RouteDecision::WouldRedirect { to } => {
                tracing::warn!(
                    path = %path,
                    to = %to,
                    "No session cookie on protected route (advisory mode, letting through)"
                );
            }
            other => {
                tracing::debug!(path = %path, decision = other.as_str(), mode = self.mode.as_str(), "Route filter");
            }
        }

        decision
    }
}

/// Segment-aware prefix match: "/student" matches "/student" and
/// "/student/thesis" but not "/students".
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}
