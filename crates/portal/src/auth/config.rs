// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: OAuth callback URLs are always origin + fixed callback path, never configured separately

use std::time::Duration;

/// Default name of the session cookie. Contains the "-auth-token" fragment
/// the edge route filter looks for.
pub const DEFAULT_SESSION_COOKIE: &str = "portal-auth-token";

/// Cookie set at sign-out so the next Google sign-in shows the account chooser
pub const LOGGED_OUT_COOKIE: &str = "portal-logged-out";

/// Cookie carrying the OAuth state between redirect and callback
pub const OAUTH_STATE_COOKIE: &str = "portal-oauth-state";

/// OAuth provider configuration
#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
}

/// Google OAuth configuration
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub base: OAuthProviderConfig,
    /// Optional: restrict to specific email domains (e.g. the university's)
    pub allowed_domains: Option<Vec<String>>,
}

/// GitHub OAuth configuration
#[derive(Debug, Clone)]
pub struct GitHubOAuthConfig {
    pub base: OAuthProviderConfig,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing session tokens
    pub secret: String,
    /// Session lifetime
    pub session_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            session_lifetime: Duration::from_secs(8 * 60 * 60), // 8 hours
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Public origin, used to build OAuth callback URLs
    pub base_url: String,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Google OAuth configuration
    pub google: Option<GoogleOAuthConfig>,
    /// GitHub OAuth configuration
    pub github: Option<GitHubOAuthConfig>,
    /// Whether to disable sign-up (registration)
    pub disable_signup: bool,
    /// Session cookie name
    pub session_cookie: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            jwt: JwtConfig::default(),
            google: None,
            github: None,
            disable_signup: false,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let base_url = std::env::var("PORTAL_BASE_URL")
            .or_else(|_| std::env::var("BASE_URL"))
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:9000".to_string());

        let secret = std::env::var("AUTH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("AUTH_JWT_SECRET not set, generating a random secret (sessions will not survive restarts)");
                use rand::Rng;
                let bytes: [u8; 32] = rand::thread_rng().gen();
                hex::encode(bytes)
            });

        let session_lifetime = std::env::var("AUTH_SESSION_LIFETIME")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| JwtConfig::default().session_lifetime);

        let google = match (
            std::env::var("AUTH_GOOGLE_CLIENT_ID"),
            std::env::var("AUTH_GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                let allowed_domains = std::env::var("AUTH_GOOGLE_ALLOWED_DOMAINS")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.split(',').map(|s| s.trim().to_lowercase()).collect());
                Some(GoogleOAuthConfig {
                    base: OAuthProviderConfig {
                        client_id,
                        client_secret,
                    },
                    allowed_domains,
                })
            }
            _ => None,
        };

        let github = match (
            std::env::var("AUTH_GITHUB_CLIENT_ID"),
            std::env::var("AUTH_GITHUB_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(GitHubOAuthConfig {
                    base: OAuthProviderConfig {
                        client_id,
                        client_secret,
                    },
                })
            }
            _ => None,
        };

        let disable_signup = std::env::var("AUTH_DISABLE_SIGNUP")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        let session_cookie = std::env::var("AUTH_SESSION_COOKIE")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());

        Self {
            base_url,
            jwt: JwtConfig {
                secret,
                session_lifetime,
            },
            google,
            github,
            disable_signup,
            session_cookie,
        }
    }

    /// Check if any OAuth provider is configured
    pub fn oauth_enabled(&self) -> bool {
        self.google.is_some() || self.github.is_some()
    }

    /// Cookies are only marked Secure when served over https
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Names of the configured OAuth providers
    pub fn oauth_providers(&self) -> Vec<String> {
        let mut providers = Vec::new();
        if self.google.is_some() {
            providers.push("google".to_string());
        }
        if self.github.is_some() {
            providers.push("github".to_string());
        }
        providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            base: OAuthProviderConfig {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            allowed_domains: None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert!(!config.oauth_enabled());
        assert!(!config.secure_cookies());
        assert!(config.oauth_providers().is_empty());
        assert!(config.session_cookie.contains("-auth-token"));
    }

    #[test]
    fn test_oauth_providers_listed() {
        let config = AuthConfig {
            google: Some(google()),
            ..Default::default()
        };
        assert!(config.oauth_enabled());
        assert_eq!(config.oauth_providers(), vec!["google".to_string()]);
    }

    #[test]
    fn test_https_origin_marks_cookies_secure() {
        let config = AuthConfig {
            base_url: "https://tesis.uni.edu".to_string(),
            ..Default::default()
        };
        assert!(config.secure_cookies());
    }
}
