//! Composition root: builds the stores and wires them through the orchestrator.

use crate::orchestrator::{Orchestrator, OrchestratorHandle};
use crate::organization_store::OrganizationStore;
use crate::search_debouncer::SearchDebouncer;
use crate::session_store::SessionStore;
use orgsync_core::OrgSyncError;
use orgsync_core::auth::{BearerToken, IdentityProvider};
use orgsync_core::config::AppConfig;
use orgsync_core::error::Result;
use orgsync_core::organization::OrganizationBackend;
use orgsync_infrastructure::{
    HttpOrganizationBackend, OrgSyncPaths, SessionFile, SupabaseIdentityProvider,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Running application: both stores plus the orchestrator connecting them.
///
/// The stores are owned here and handed out by reference; nothing is global.
pub struct AppContext {
    pub session: Arc<SessionStore>,
    pub organizations: Arc<OrganizationStore>,
    orchestrator: OrchestratorHandle,
    background: Vec<JoinHandle<()>>,
}

impl AppContext {
    /// Wires the stores around the given collaborators and starts the
    /// orchestrator, which resolves the existing session.
    pub async fn start(
        provider: Arc<dyn IdentityProvider>,
        backend: Arc<dyn OrganizationBackend>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let session = Arc::new(SessionStore::new(provider, events_tx));
        let organizations = Arc::new(OrganizationStore::new(backend, BearerToken::new()));

        let orchestrator =
            Orchestrator::new(session.clone(), organizations.clone(), events_rx)
                .start()
                .await;

        tracing::info!(
            "[AppContext] Started (authenticated: {})",
            session.state().is_authenticated()
        );

        Self {
            session,
            organizations,
            orchestrator,
            background: Vec::new(),
        }
    }

    /// Builds the Supabase provider and HTTP backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `OrgSyncError::Config` when the identity provider is not
    /// configured or the session file location cannot be resolved.
    pub async fn start_from_config(config: &AppConfig, paths: &OrgSyncPaths) -> Result<Self> {
        let session_file = paths
            .session_file()
            .map(SessionFile::new)
            .map_err(|e| OrgSyncError::config(e.to_string()))?;

        let provider = Arc::new(
            SupabaseIdentityProvider::from_config(&config.identity, Some(session_file)).await?,
        );
        let backend = HttpOrganizationBackend::new(config.api.base_url.clone());

        // After start, so the initial `get_session` does any overdue refresh.
        let mut context = Self::start(provider.clone(), Arc::new(backend)).await;
        context.background.push(provider.spawn_auto_refresh());
        Ok(context)
    }

    pub fn search_debouncer(&self) -> SearchDebouncer {
        SearchDebouncer::new(self.organizations.clone())
    }

    /// Stops the orchestrator and background tasks. The stores stay usable
    /// but no longer follow session changes.
    pub async fn shutdown(self) {
        for task in self.background {
            task.abort();
        }
        self.orchestrator.shutdown().await;
        tracing::debug!("[AppContext] Shut down");
    }
}
