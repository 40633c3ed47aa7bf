//! Authentication domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Opaque user id issued by the identity provider
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A live session issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserRef,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Returns true when the access token expires within `leeway_secs` of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_secs: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now + chrono::Duration::seconds(leeway_secs))
    }
}

/// Kind of change delivered by the provider's change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// One notification of the provider's change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStateChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthStateChange {
    pub fn new(event: AuthEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}

/// Result of a sign-up call.
///
/// `session` is `None` when the provider requires email confirmation before
/// the first sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpOutcome {
    pub user: Option<UserRef>,
    pub session: Option<Session>,
}

impl SignUpOutcome {
    pub fn requires_confirmation(&self) -> bool {
        self.session.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            user: UserRef {
                id: "u1".to_string(),
                email: Some("a@example.com".to_string()),
            },
            access_token: "token".to_string(),
            refresh_token: None,
            expires_at,
        }
    }

    #[test]
    fn test_session_expiry_with_leeway() {
        let now = Utc::now();
        assert!(!session(None).is_expired_at(now, 60));
        assert!(session(Some(now + chrono::Duration::seconds(30))).is_expired_at(now, 60));
        assert!(!session(Some(now + chrono::Duration::seconds(3600))).is_expired_at(now, 60));
    }

    #[test]
    fn test_auth_event_wire_names() {
        let json = serde_json::to_string(&AuthEvent::TokenRefreshed).unwrap();
        assert_eq!(json, "\"TOKEN_REFRESHED\"");
    }
}
