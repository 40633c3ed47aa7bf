use super::model::{Session, UserRef};
use serde::{Deserialize, Serialize};

/// Observable state of the session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub user: Option<UserRef>,
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for SessionState {
    /// The session is unresolved until the store is initialized.
    fn default() -> Self {
        Self {
            user: None,
            session: None,
            loading: true,
            error: None,
        }
    }
}

impl SessionState {
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Typed notification from the session store to its single consumer.
///
/// Carries no token: the consumer reads the current one from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user: UserRef },
    SignedOut,
}

impl SessionEvent {
    /// Derives the event for a freshly written session.
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => Self::SignedIn {
                user: session.user.clone(),
            },
            None => Self::SignedOut,
        }
    }
}
