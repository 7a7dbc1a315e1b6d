// Authentication HTTP routes
// Decision: Pages and auth share one origin, so auth lives under /auth/* without a version prefix
// Decision: Cookie-based sessions; the login response also carries the token for API clients
// Decision: OAuth state is kept in a short-lived cookie scoped to the callback path

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thesis_portal_core::{
    LogoutHint, OAuthProvider, SessionSource, SignInOptions, CALLBACK_PATH, DASHBOARD_PATH,
};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    config::{LOGGED_OUT_COOKIE, OAUTH_STATE_COOKIE},
    jwt::IssuedSession,
    middleware::{AuthError, AuthState},
    oauth::{OAuthService, OAuthUserInfo},
};
use crate::storage::{
    models::{CreateUserRow, UserRow},
    password::{hash_password, verify_password, MIN_PASSWORD_LEN},
};

/// How long the OAuth state cookie lives
const OAUTH_STATE_TTL_SECS: i64 = 10 * 60;

/// How long the logged-out flag survives in the browser
const LOGGED_OUT_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Generate a random state string for OAuth (32 hex characters)
fn generate_oauth_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Token response
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Current session as seen by the identity provider
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

/// Session lookup response; `session` is null without a valid session
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session: Option<SessionInfo>,
}

/// OAuth redirect query parameters
#[derive(Debug, Deserialize)]
pub struct OAuthRedirectQuery {
    /// `true` right after a sign-out
    pub logout: Option<String>,
}

/// OAuth callback query parameters
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: String,
}

/// Auth configuration response
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthConfigResponse {
    pub password_auth_enabled: bool,
    pub oauth_providers: Vec<String>,
    pub signup_enabled: bool,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/auth/config", get(get_auth_config))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(get_session))
        // OAuth routes
        .route("/auth/oauth/:provider", get(oauth_redirect))
        .route("/auth/callback/:provider", get(oauth_callback))
        .with_state(state)
}

/// GET /auth/config - Get authentication configuration
#[utoipa::path(
    get,
    path = "/auth/config",
    responses((status = 200, description = "Sign-in methods", body = AuthConfigResponse)),
    tag = "auth"
)]
pub async fn get_auth_config(State(state): State<AuthState>) -> Json<AuthConfigResponse> {
    Json(AuthConfigResponse {
        password_auth_enabled: true,
        oauth_providers: state.config.oauth_providers(),
        signup_enabled: !state.config.disable_signup,
    })
}

/// POST /auth/login - Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AuthError> {
    let email = req.email.trim();

    let user = state
        .db
        .get_user_by_email(email)
        .await
        .map_err(|e| {
            tracing::error!("Database error during login: {}", e);
            AuthError::internal("Login failed")
        })?
        .ok_or_else(|| AuthError::unauthorized("Invalid email or password"))?;

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or_else(|| AuthError::unauthorized("Password login not available for this account"))?;

    let valid = verify_password(&req.password, password_hash).map_err(|e| {
        tracing::error!("Password verification error: {}", e);
        AuthError::internal("Login failed")
    })?;

    if !valid {
        return Err(AuthError::unauthorized("Invalid email or password"));
    }

    tracing::info!(user_id = %user.id, "User signed in with password");
    start_session(&state, jar, &user)
}

/// POST /auth/register - Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account and empty profile created", body = TokenResponse),
        (status = 403, description = "Sign-up disabled"),
        (status = 422, description = "Invalid input or email taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<TokenResponse>), AuthError> {
    if state.config.disable_signup {
        return Err(AuthError::forbidden("Registration is disabled"));
    }

    let email = req.email.trim().to_string();
    let name = req.name.trim().to_string();
    if !email.contains('@') {
        return Err(AuthError::unprocessable("A valid email is required"));
    }
    if name.is_empty() {
        return Err(AuthError::unprocessable("Name is required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::unprocessable(&format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let existing = state.db.get_user_by_email(&email).await.map_err(|e| {
        tracing::error!("Database error during registration: {}", e);
        AuthError::internal("Registration failed")
    })?;

    if existing.is_some() {
        return Err(AuthError::unprocessable("Email already registered"));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        AuthError::internal("Registration failed")
    })?;

    let user = create_account(
        &state,
        CreateUserRow {
            email,
            name,
            avatar_url: None,
            password_hash: Some(password_hash),
            auth_provider: Some("local".to_string()),
            auth_provider_id: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");
    let (jar, json) = start_session(&state, jar, &user)?;
    Ok((StatusCode::CREATED, jar, json))
}

/// POST /auth/logout - Clear the session and remember the sign-out
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Signed out")),
    tag = "auth"
)]
pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> (StatusCode, CookieJar) {
    let flag = Cookie::build((LOGGED_OUT_COOKIE, "true"))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(LOGGED_OUT_TTL_SECS))
        .build();

    let jar = jar
        .remove(Cookie::build(state.config.session_cookie.clone()).path("/"))
        .add(flag);

    (StatusCode::NO_CONTENT, jar)
}

/// GET /auth/session - Current session, if any
#[utoipa::path(
    get,
    path = "/auth/session",
    responses((status = 200, description = "Current session or null", body = SessionResponse)),
    tag = "auth"
)]
pub async fn get_session(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AuthError> {
    let session = state
        .request_session(&headers)
        .current_session()
        .await
        .map_err(|e| {
            tracing::error!("Session lookup failed: {}", e);
            AuthError::internal("Session lookup failed")
        })?;

    Ok(Json(SessionResponse {
        session: session.map(|s| SessionInfo {
            user_id: s.user_id,
            email: s.email,
            name: s.name,
            expires_at: s.expires_at,
        }),
    }))
}

/// GET /auth/oauth/:provider - Redirect to OAuth provider
pub async fn oauth_redirect(
    State(state): State<AuthState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthRedirectQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let provider = OAuthProvider::from_str(&provider)
        .ok_or_else(|| AuthError::not_found("Unknown OAuth provider"))?;
    let service = OAuthService::for_provider(&state.config, provider)
        .ok_or_else(|| AuthError::not_found("OAuth provider not configured"))?;

    let hint = LogoutHint::from_sources(
        query.logout.as_deref(),
        jar.get(LOGGED_OUT_COOKIE).is_some(),
    );
    let options = SignInOptions::for_oauth(&state.config.base_url, provider, hint);

    // Random state for CSRF protection, checked again at the callback
    let oauth_state = generate_oauth_state();
    let auth_url = service
        .authorization_url(&oauth_state, &options)
        .map_err(|e| {
            tracing::error!("Failed to build authorization URL: {}", e);
            AuthError::internal("OAuth configuration error")
        })?;

    tracing::debug!(
        provider = provider.as_str(),
        logout_detected = hint.detected(),
        "Redirecting to OAuth provider"
    );

    let state_cookie = Cookie::build((OAUTH_STATE_COOKIE, auth_url.state))
        .path(CALLBACK_PATH)
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(OAUTH_STATE_TTL_SECS))
        .build();

    let mut jar = jar.add(state_cookie);
    if options.clear_logout_flag {
        jar = jar.remove(Cookie::build(LOGGED_OUT_COOKIE).path("/"));
    }

    Ok((jar, Redirect::to(&auth_url.url)))
}

/// GET /auth/callback/:provider - OAuth callback
pub async fn oauth_callback(
    State(state): State<AuthState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let provider = OAuthProvider::from_str(&provider)
        .ok_or_else(|| AuthError::not_found("Unknown OAuth provider"))?;

    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    if expected_state.as_deref() != Some(query.state.as_str()) {
        tracing::warn!(provider = provider.as_str(), "OAuth state mismatch");
        return Err(AuthError::unauthorized("Invalid OAuth state"));
    }
    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path(CALLBACK_PATH));

    let service = OAuthService::for_provider(&state.config, provider)
        .ok_or_else(|| AuthError::not_found("OAuth provider not configured"))?;

    let user_info = service.exchange_code(&query.code).await.map_err(|e| {
        tracing::error!("OAuth exchange failed: {}", e);
        AuthError::unauthorized("OAuth authentication failed")
    })?;

    let user = find_or_create_oauth_user(&state, provider, user_info).await?;

    tracing::info!(user_id = %user.id, provider = provider.as_str(), "User signed in with OAuth");
    let (jar, _) = start_session(&state, jar, &user)?;

    Ok((jar, Redirect::to(DASHBOARD_PATH)))
}

/// Helper: Find the account linked to the provider identity, or create one
async fn find_or_create_oauth_user(
    state: &AuthState,
    provider: OAuthProvider,
    user_info: OAuthUserInfo,
) -> Result<UserRow, AuthError> {
    let provider_str = provider.as_str();
    let existing = state
        .db
        .get_user_by_oauth(provider_str, &user_info.provider_id)
        .await
        .map_err(|e| {
            tracing::error!("Database error during OAuth: {}", e);
            AuthError::internal("OAuth authentication failed")
        })?;

    if let Some(user) = existing {
        return Ok(user);
    }

    let by_email = state
        .db
        .get_user_by_email(&user_info.email)
        .await
        .map_err(|e| {
            tracing::error!("Database error during OAuth: {}", e);
            AuthError::internal("OAuth authentication failed")
        })?;

    if by_email.is_some() {
        // Accounts are never linked implicitly
        return Err(AuthError::unauthorized(
            "An account with this email already exists. Please login with your existing credentials.",
        ));
    }

    create_account(
        state,
        CreateUserRow {
            email: user_info.email,
            name: user_info.name,
            avatar_url: user_info.avatar_url,
            password_hash: None,
            auth_provider: Some(provider_str.to_string()),
            auth_provider_id: Some(user_info.provider_id),
        },
    )
    .await
}

/// Helper: Create the account and its empty profile
async fn create_account(state: &AuthState, input: CreateUserRow) -> Result<UserRow, AuthError> {
    let user = state.db.create_user(input).await.map_err(|e| {
        tracing::error!("User creation error: {}", e);
        AuthError::internal("Account creation failed")
    })?;

    state.db.create_profile(user.id).await.map_err(|e| {
        tracing::error!("Profile creation error: {}", e);
        AuthError::internal("Account creation failed")
    })?;

    Ok(user)
}

/// Helper: Issue a session token and set the session cookie
fn start_session(
    state: &AuthState,
    jar: CookieJar,
    user: &UserRow,
) -> Result<(CookieJar, Json<TokenResponse>), AuthError> {
    let IssuedSession { token, .. } = state
        .jwt_service
        .issue(user.id, &user.email, &user.name)
        .map_err(|e| {
            tracing::error!("Token generation error: {}", e);
            AuthError::internal("Login failed")
        })?;

    let expires_in = state.jwt_service.session_lifetime_secs();
    let session_cookie = Cookie::build((state.config.session_cookie.clone(), token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(expires_in))
        .build();

    Ok((
        jar.add(session_cookie),
        Json(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in,
        }),
    ))
}
