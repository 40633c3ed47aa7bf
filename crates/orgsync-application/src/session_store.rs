//! Session store: the observable authentication state.

use orgsync_core::auth::{
    AuthStateChange, IdentityProvider, Session, SessionEvent, SessionState, SignUpOutcome,
};
use orgsync_core::error::Result;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// A [`SessionEvent`] on its way to the orchestrator.
///
/// The store that sent it waits until the notice is acknowledged (or
/// dropped unanswered) before the session write counts as complete.
#[derive(Debug)]
pub struct SessionNotice {
    pub event: SessionEvent,
    ack: oneshot::Sender<()>,
}

impl SessionNotice {
    pub fn new(event: SessionEvent) -> (Self, oneshot::Receiver<()>) {
        let (ack, applied) = oneshot::channel();
        (Self { event, ack }, applied)
    }

    /// Marks the event as applied, releasing the waiting store.
    pub fn acknowledge(self) {
        let _ = self.ack.send(());
    }
}

/// Observable container for the current user and session.
///
/// Every write of the session (initial resolution, sign-in, sign-out, and
/// each change delivered by the provider's feed) emits exactly one
/// [`SessionNotice`] on the channel handed to [`SessionStore::new`], and
/// waits for its consumer to acknowledge it. When `sign_in` or `sign_out`
/// returns, the orchestrator has already applied the change. The
/// orchestrator is the only consumer of that channel.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
    events: mpsc::UnboundedSender<SessionNotice>,
    feed_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        events: mpsc::UnboundedSender<SessionNotice>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            provider,
            state: Arc::new(state),
            events,
            feed_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Access token of the current session, if signed in.
    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token().map(str::to_string)
    }

    /// Resolves the existing session and starts following the provider feed.
    ///
    /// Never fails: a provider error is recorded in `error` and the store
    /// stays signed out without subscribing to the feed.
    pub async fn initialize(&self) {
        tracing::debug!("[SessionStore] Initializing");
        // Subscribe before resolving so no change between the two is missed.
        let feed = (!self.is_following_feed()).then(|| self.provider.on_auth_state_change());

        match self.provider.get_session().await {
            Ok(session) => {
                publish(&self.state, &self.events, session).await;
            }
            Err(e) => {
                tracing::warn!("[SessionStore] Failed to resolve session: {}", e);
                self.state.send_modify(|state| {
                    state.error = Some(e.to_string());
                    state.loading = false;
                });
                return;
            }
        }

        let Some(feed) = feed else {
            return;
        };
        let mut slot = self
            .feed_task
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            tracing::debug!("[SessionStore] Following provider changes");
            *slot = Some(tokio::spawn(follow_feed(
                feed,
                self.state.clone(),
                self.events.clone(),
            )));
        }
    }

    /// True once `initialize` has subscribed to the provider feed.
    pub fn is_following_feed(&self) -> bool {
        self.feed_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Password sign-in.
    ///
    /// On failure the error message is stored and the error returned.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => {
                tracing::debug!("[SessionStore] Signed in as {}", session.user.id);
                publish(&self.state, &self.events, Some(session)).await;
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e.to_string());
                Err(e)
            }
        }
    }

    /// Registers a new account.
    ///
    /// Does not touch the session; a signed-in session, if the provider
    /// issued one, arrives through the provider feed.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        match self.provider.sign_up(email, password).await {
            Ok(outcome) => {
                self.state.send_modify(|state| state.loading = false);
                Ok(outcome)
            }
            Err(e) => {
                self.record_failure(&e.to_string());
                Err(e)
            }
        }
    }

    /// Ends the session.
    ///
    /// On failure the local user and session are left as they were.
    pub async fn sign_out(&self) -> Result<()> {
        self.state.send_modify(|state| state.loading = true);

        match self.provider.sign_out().await {
            Ok(()) => {
                tracing::debug!("[SessionStore] Signed out");
                publish(&self.state, &self.events, None).await;
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e.to_string());
                Err(e)
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    fn record_failure(&self, message: &str) {
        tracing::warn!("[SessionStore] {}", message);
        self.state.send_modify(|state| {
            state.error = Some(message.to_string());
            state.loading = false;
        });
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        let task = self
            .feed_task
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Writes `session`, clears `loading`, emits the matching event and waits
/// until the consumer has applied it.
async fn publish(
    state: &watch::Sender<SessionState>,
    events: &mpsc::UnboundedSender<SessionNotice>,
    session: Option<Session>,
) {
    let (notice, applied) = SessionNotice::new(SessionEvent::from_session(session.as_ref()));
    state.send_modify(|state| {
        state.user = session.as_ref().map(|s| s.user.clone());
        state.session = session;
        state.loading = false;
    });
    if events.send(notice).is_err() {
        tracing::debug!("[SessionStore] No event consumer; event dropped");
        return;
    }
    if applied.await.is_err() {
        tracing::debug!("[SessionStore] Event dropped before it was applied");
    }
}

async fn follow_feed(
    mut feed: broadcast::Receiver<AuthStateChange>,
    state: Arc<watch::Sender<SessionState>>,
    events: mpsc::UnboundedSender<SessionNotice>,
) {
    loop {
        match feed.recv().await {
            Ok(change) => {
                tracing::debug!("[SessionStore] Provider change: {:?}", change.event);
                publish(&state, &events, change.session).await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("[SessionStore] Missed {} provider changes", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
