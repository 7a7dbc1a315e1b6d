// OAuth services for Google and GitHub sign-in
// Decision: Manual OAuth2 implementation (authorization URL + code exchange + userinfo)
// Decision: Provider endpoints are overridable so the exchange can be tested against a mock server

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use thesis_portal_core::{callback_url, OAuthProvider, SignInOptions};
use url::Url;

use super::config::{AuthConfig, GitHubOAuthConfig, GoogleOAuthConfig};

/// User info from OAuth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthUserInfo {
    /// Provider user ID
    pub provider_id: String,
    /// User email
    pub email: String,
    /// User name
    pub name: String,
    /// Avatar URL
    pub avatar_url: Option<String>,
}

/// OAuth authorization URL with state
#[derive(Debug)]
pub struct OAuthAuthorizationUrl {
    pub url: String,
    pub state: String,
}

/// Provider endpoints
#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl OAuthEndpoints {
    pub fn google() -> Self {
        Self {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        }
    }

    pub fn github() -> Self {
        Self {
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            userinfo_url: "https://api.github.com/user".to_string(),
        }
    }
}

fn authorization_url(
    endpoint: &str,
    params: &[(&str, &str)],
    options: &SignInOptions,
    state: &str,
) -> Result<OAuthAuthorizationUrl> {
    let mut url = Url::parse_with_params(endpoint, params).context("Invalid authorize URL")?;
    options.apply_to(&mut url);
    Ok(OAuthAuthorizationUrl {
        url: url.into(),
        state: state.to_string(),
    })
}

/// Google OAuth service
pub struct GoogleOAuthService {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    allowed_domains: Option<Vec<String>>,
    endpoints: OAuthEndpoints,
}

impl GoogleOAuthService {
    pub fn new(config: &GoogleOAuthConfig, base_url: &str) -> Self {
        Self {
            client_id: config.base.client_id.clone(),
            client_secret: config.base.client_secret.clone(),
            redirect_uri: callback_url(base_url, OAuthProvider::Google),
            allowed_domains: config.allowed_domains.clone(),
            endpoints: OAuthEndpoints::google(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: OAuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Generate authorization URL for OAuth flow
    pub fn authorization_url(
        &self,
        state: &str,
        options: &SignInOptions,
    ) -> Result<OAuthAuthorizationUrl> {
        authorization_url(
            &self.endpoints.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", options.redirect_to.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
            options,
            state,
        )
    }

    /// Exchange authorization code for user info
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthUserInfo> {
        let client = reqwest::Client::new();

        let token_response: TokenResponse = client
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Failed to exchange code")?
            .error_for_status()
            .context("Token endpoint rejected the code")?
            .json()
            .await
            .context("Failed to parse token response")?;

        let user_info: GoogleUserInfo = client
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(&token_response.access_token)
            .send()
            .await
            .context("Failed to fetch user info")?
            .error_for_status()
            .context("Userinfo endpoint rejected the token")?
            .json()
            .await
            .context("Failed to parse user info")?;

        if !user_info.email_verified.unwrap_or(false) {
            return Err(anyhow!("Google account email is not verified"));
        }
        self.check_domain(&user_info.email)?;

        Ok(OAuthUserInfo {
            provider_id: user_info.sub,
            name: user_info.name.unwrap_or_else(|| user_info.email.clone()),
            email: user_info.email,
            avatar_url: user_info.picture,
        })
    }

    fn check_domain(&self, email: &str) -> Result<()> {
        let Some(allowed) = &self.allowed_domains else {
            return Ok(());
        };
        let domain = email
            .rsplit_once('@')
            .map(|(_, d)| d.to_lowercase())
            .unwrap_or_default();
        if allowed.iter().any(|d| *d == domain) {
            Ok(())
        } else {
            Err(anyhow!("Email domain '{}' is not allowed", domain))
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
    email_verified: Option<bool>,
}

/// GitHub OAuth service
pub struct GitHubOAuthService {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: OAuthEndpoints,
}

impl GitHubOAuthService {
    pub fn new(config: &GitHubOAuthConfig, base_url: &str) -> Self {
        Self {
            client_id: config.base.client_id.clone(),
            client_secret: config.base.client_secret.clone(),
            redirect_uri: callback_url(base_url, OAuthProvider::GitHub),
            endpoints: OAuthEndpoints::github(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: OAuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Generate authorization URL for OAuth flow
    pub fn authorization_url(
        &self,
        state: &str,
        options: &SignInOptions,
    ) -> Result<OAuthAuthorizationUrl> {
        authorization_url(
            &self.endpoints.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", options.redirect_to.as_str()),
                ("scope", "user:email read:user"),
                ("state", state),
            ],
            options,
            state,
        )
    }

    /// Exchange authorization code for user info
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthUserInfo> {
        let client = reqwest::Client::new();

        let token_response: TokenResponse = client
            .post(&self.endpoints.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .context("Failed to exchange code")?
            .error_for_status()
            .context("Token endpoint rejected the code")?
            .json()
            .await
            .context("Failed to parse token response")?;

        let access_token = &token_response.access_token;

        let user_info: GitHubUserInfo = client
            .get(&self.endpoints.userinfo_url)
            .header("User-Agent", "thesis-portal")
            .bearer_auth(access_token)
            .send()
            .await
            .context("Failed to fetch user info")?
            .error_for_status()
            .context("User endpoint rejected the token")?
            .json()
            .await
            .context("Failed to parse user info")?;

        // GitHub may hide the email on the profile; fall back to the primary verified address
        let email = match user_info.email {
            Some(email) => email,
            None => {
                let emails: Vec<GitHubEmail> = client
                    .get(format!("{}/emails", self.endpoints.userinfo_url))
                    .header("User-Agent", "thesis-portal")
                    .bearer_auth(access_token)
                    .send()
                    .await
                    .context("Failed to fetch user emails")?
                    .json()
                    .await
                    .context("Failed to parse user emails")?;

                emails
                    .into_iter()
                    .find(|e| e.primary && e.verified)
                    .map(|e| e.email)
                    .ok_or_else(|| anyhow!("No verified primary email found"))?
            }
        };

        Ok(OAuthUserInfo {
            provider_id: user_info.id.to_string(),
            email,
            name: user_info.name.unwrap_or_else(|| user_info.login.clone()),
            avatar_url: Some(user_info.avatar_url),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GitHubUserInfo {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// A configured OAuth provider client
pub enum OAuthService {
    Google(GoogleOAuthService),
    GitHub(GitHubOAuthService),
}

impl OAuthService {
    /// Client for `provider`, or None when the provider is not configured
    pub fn for_provider(config: &AuthConfig, provider: OAuthProvider) -> Option<Self> {
        match provider {
            OAuthProvider::Google => config
                .google
                .as_ref()
                .map(|c| Self::Google(GoogleOAuthService::new(c, &config.base_url))),
            OAuthProvider::GitHub => config
                .github
                .as_ref()
                .map(|c| Self::GitHub(GitHubOAuthService::new(c, &config.base_url))),
        }
    }

    pub fn authorization_url(
        &self,
        state: &str,
        options: &SignInOptions,
    ) -> Result<OAuthAuthorizationUrl> {
        match self {
            Self::Google(service) => service.authorization_url(state, options),
            Self::GitHub(service) => service.authorization_url(state, options),
        }
    }

    pub async fn exchange_code(&self, code: &str) -> Result<OAuthUserInfo> {
        match self {
            Self::Google(service) => service.exchange_code(code).await,
            Self::GitHub(service) => service.exchange_code(code).await,
        }
    }
}
