//! Identity provider trait.

use super::model::{AuthStateChange, Session, SignUpOutcome};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// An abstract identity provider.
///
/// The provider owns session issuance and may persist its own session. The
/// change feed delivers every session change (sign-in, sign-out, token
/// refresh) until the provider is dropped.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the current session, if any.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Password sign-in. Provider errors surface as `OrgSyncError::Auth`.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Registers a new account. Success does not imply a session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Subscribes to the change feed.
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange>;
}
