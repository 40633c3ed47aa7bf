//! Orchestrator: propagates session changes into the organization store.

use crate::organization_store::OrganizationStore;
use crate::session_store::{SessionNotice, SessionStore};
use orgsync_core::auth::SessionEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Sole consumer of [`SessionEvent`]s and sole writer of the organization
/// store's token and reset surface.
///
/// Each notice is acknowledged only after the organization store has been
/// updated.
pub struct Orchestrator {
    session_store: Arc<SessionStore>,
    organization_store: Arc<OrganizationStore>,
    events: mpsc::UnboundedReceiver<SessionNotice>,
}

impl Orchestrator {
    pub fn new(
        session_store: Arc<SessionStore>,
        organization_store: Arc<OrganizationStore>,
        events: mpsc::UnboundedReceiver<SessionNotice>,
    ) -> Self {
        Self {
            session_store,
            organization_store,
            events,
        }
    }

    /// Starts reacting to session events, then initializes the session store.
    ///
    /// The loop runs before initialization so the restored session's notice
    /// is acknowledged; its token is attached by the time this returns.
    pub async fn start(self) -> OrchestratorHandle {
        let session_store = self.session_store.clone();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(shutdown.clone()));
        tracing::debug!("[Orchestrator] Started");

        session_store.initialize().await;

        OrchestratorHandle { shutdown, task }
    }

    async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("[Orchestrator] Shutting down");
                    break;
                }
                event = self.events.recv() => match event {
                    Some(notice) => self.handle_notice(notice),
                    None => {
                        tracing::debug!("[Orchestrator] Session store gone; stopping");
                        break;
                    }
                },
            }
        }
    }

    fn handle_notice(&self, notice: SessionNotice) {
        match &notice.event {
            SessionEvent::SignedIn { user } => {
                tracing::debug!("[Orchestrator] Signed in: {}", user.id);
                self.organization_store
                    .set_auth_token(self.session_store.access_token());
            }
            SessionEvent::SignedOut => {
                tracing::debug!("[Orchestrator] Signed out; resetting organizations");
                // Token first, so nothing can go out with it after the reset.
                self.organization_store.set_auth_token(None);
                self.organization_store.reset();
            }
        }
        notice.acknowledge();
    }
}

/// Handle to a running [`Orchestrator`].
pub struct OrchestratorHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl OrchestratorHandle {
    /// Stops the event loop and waits for it to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("[Orchestrator] Event loop ended abnormally: {}", e);
        }
    }
}
