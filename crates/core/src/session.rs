// Session domain type
//
// A session is issued by the identity provider at sign-in and destroyed at
// sign-out or expiry. The portal only ever reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Active session as seen by the portal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Session {
    /// Identifier of the signed-in account. Profiles are keyed by this value.
    pub user_id: Uuid,
    /// Account email.
    pub email: String,
    /// Display name from the identity provider.
    pub name: String,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_expiring(at: DateTime<Utc>) -> Session {
        Session {
            user_id: Uuid::nil(),
            email: "student@uni.edu".to_string(),
            name: "Student".to_string(),
            issued_at: at - Duration::hours(1),
            expires_at: at,
        }
    }

    #[test]
    fn test_session_expiry_boundary() {
        let now = Utc::now();
        let session = session_expiring(now);

        assert!(session.is_expired_at(now));
        assert!(!session.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_fresh_session_not_expired() {
        let session = session_expiring(Utc::now() + Duration::minutes(15));
        assert!(!session.is_expired());
    }
}
