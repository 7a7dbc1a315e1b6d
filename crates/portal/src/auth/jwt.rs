// JWT session tokens
// Decision: Use HS256 algorithm for simplicity (symmetric key)
// Decision: One session token, no refresh tokens. Expiry ends the session.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thesis_portal_core::Session;
use uuid::Uuid;

use super::config::JwtConfig;

const SESSION_TOKEN_TYPE: &str = "session";

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// User name
    pub name: String,
    /// Token type
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl SessionClaims {
    pub fn into_session(self) -> Result<Session> {
        let user_id = Uuid::parse_str(&self.sub).context("Invalid user ID in token")?;
        Ok(Session {
            user_id,
            email: self.email,
            name: self.name,
            issued_at: timestamp(self.iat)?,
            expires_at: timestamp(self.exp)?,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| anyhow!("Invalid timestamp in token: {}", secs))
}

/// Signed token plus the session it encodes
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

/// JWT service for session issuance and validation
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Session lifetime in seconds
    pub fn session_lifetime_secs(&self) -> i64 {
        self.config.session_lifetime.as_secs() as i64
    }

    /// Issue a session token for a user
    pub fn issue(&self, user_id: Uuid, email: &str, name: &str) -> Result<IssuedSession> {
        self.issue_at(user_id, email, name, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession> {
        let exp = now + Duration::from_std(self.config.session_lifetime)?;

        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            token_type: SESSION_TOKEN_TYPE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode session token")?;
        let session = claims.into_session()?;

        Ok(IssuedSession { token, session })
    }

    /// Validate a session token and return its claims
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .context("Invalid session token")?;

        if token_data.claims.token_type != SESSION_TOKEN_TYPE {
            return Err(anyhow!("Not a session token"));
        }

        Ok(token_data.claims)
    }
}
