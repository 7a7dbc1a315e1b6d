// Authentication middleware and extractors
// Decision: Support both cookie-based (pages) and header-based (API) auth
// Decision: The session cookie is the only credential the pages know about

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use std::sync::Arc;
use thesis_portal_core::{ProviderError, Session, SessionSource};
use uuid::Uuid;

use super::{config::AuthConfig, jwt::JwtService};
use crate::storage::StorageBackend;

/// Authentication error
#[derive(Debug, Clone, Serialize)]
pub struct AuthError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthError {
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn forbidden(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::FORBIDDEN,
        }
    }

    pub fn unprocessable(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn internal(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Authenticated user context extracted from request
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID
    pub id: Uuid,
    /// User email
    pub email: String,
    /// User name
    pub name: String,
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
    pub db: Arc<StorageBackend>,
}

impl AuthState {
    pub fn new(config: AuthConfig, db: Arc<StorageBackend>) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        Self {
            config,
            jwt_service,
            db,
        }
    }

    /// Session source for one request
    pub fn request_session(&self, headers: &HeaderMap) -> RequestSession {
        RequestSession {
            token: session_token(headers, &self.config.session_cookie),
            jwt: self.jwt_service.clone(),
        }
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// Session token from the Authorization header or the session cookie
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Per-request session lookup over the session token
pub struct RequestSession {
    token: Option<String>,
    jwt: Arc<JwtService>,
}

impl RequestSession {
    pub fn new(token: Option<String>, jwt: Arc<JwtService>) -> Self {
        Self { token, jwt }
    }
}

#[async_trait]
impl SessionSource for RequestSession {
    /// Invalid or expired tokens read as "no session"; a token that verifies
    /// but carries unreadable claims is a lookup failure.
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        let Some(token) = &self.token else {
            return Ok(None);
        };

        let claims = match self.jwt.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Session token rejected: {}", e);
                return Ok(None);
            }
        };

        claims
            .into_session()
            .map(Some)
            .map_err(|e| ProviderError::malformed(e.to_string()))
    }
}

/// Extractor for authenticated user
/// This is required - returns 401 if not authenticated
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let session = auth_state
            .request_session(&parts.headers)
            .current_session()
            .await
            .map_err(|e| {
                tracing::debug!("Session lookup failed: {}", e);
                AuthError::unauthorized("Invalid or expired token")
            })?
            .ok_or_else(|| AuthError::unauthorized("Authentication required"))?;

        Ok(AuthUser {
            id: session.user_id,
            email: session.email,
            name: session.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::{JwtConfig, DEFAULT_SESSION_COOKIE};
    use axum::http::HeaderValue;

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(JwtConfig {
            secret: "middleware-test-secret".to_string(),
            ..Default::default()
        }))
    }

    #[test]
    fn test_session_token_from_cookie_or_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers, DEFAULT_SESSION_COOKIE), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; portal-auth-token=abc"),
        );
        assert_eq!(
            session_token(&headers, DEFAULT_SESSION_COOKIE).as_deref(),
            Some("abc")
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(
            session_token(&headers, DEFAULT_SESSION_COOKIE).as_deref(),
            Some("xyz")
        );
    }

    #[tokio::test]
    async fn test_request_session_resolves_valid_token() {
        let jwt = jwt();
        let user_id = Uuid::now_v7();
        let issued = jwt.issue(user_id, "ana@uni.edu", "Ana").unwrap();

        let source = RequestSession::new(Some(issued.token), jwt);
        let session = source.current_session().await.unwrap().unwrap();
        assert_eq!(session.user_id, user_id);
    }

    #[tokio::test]
    async fn test_request_session_treats_bad_token_as_absent() {
        let source = RequestSession::new(Some("garbage".to_string()), jwt());
        assert!(source.current_session().await.unwrap().is_none());

        let source = RequestSession::new(None, jwt());
        assert!(source.current_session().await.unwrap().is_none());
    }

    #[test]
    fn test_auth_error_status() {
        assert_eq!(
            AuthError::unauthorized("x").status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::forbidden("x").status, StatusCode::FORBIDDEN);
    }
}
