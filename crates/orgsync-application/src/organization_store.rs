//! Organization store: the locally cached organization collection.

use orgsync_core::OrgSyncError;
use orgsync_core::auth::BearerToken;
use orgsync_core::error::Result;
use orgsync_core::organization::{
    NewOrganization, Organization, OrganizationBackend, OrganizationPatch, OrganizationState,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Observable container for the organization collection.
///
/// `OrganizationStore` is responsible for:
/// - CRUD and search calls against the backend
/// - Keeping the cached collection in step with successful mutations
/// - A single coarse `loading` flag and the last error message
///
/// Every asynchronous operation sets `loading = true, error = None` on entry
/// and `loading = false` on completion. A failure is written to `error` and
/// returned; the returned error displays exactly the stored message.
///
/// # Superseded results
///
/// Operations that replace the whole collection (fetch, search, clear search)
/// are stamped with a generation. A result only lands if no newer
/// list-replacing call has started since, so a slow search cannot overwrite
/// a faster later one. [`reset`](Self::reset) starts a new epoch: anything
/// still in flight from before it is discarded on arrival.
pub struct OrganizationStore {
    backend: Arc<dyn OrganizationBackend>,
    token: BearerToken,
    state: watch::Sender<OrganizationState>,
    list_generation: AtomicU64,
    epoch: AtomicU64,
}

impl OrganizationStore {
    /// Creates an empty store.
    ///
    /// # Arguments
    ///
    /// * `backend` - Client for the remote organizations resource
    /// * `token` - Slot holding the bearer token attached to every request
    pub fn new(backend: Arc<dyn OrganizationBackend>, token: BearerToken) -> Self {
        let (state, _) = watch::channel(OrganizationState::default());
        Self {
            backend,
            token,
            state,
            list_generation: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> OrganizationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrganizationState> {
        self.state.subscribe()
    }

    /// Attaches (or with `None`, removes) the bearer credential for all
    /// subsequent requests. Leaves the cached collection alone.
    pub fn set_auth_token(&self, token: Option<String>) {
        tracing::debug!(
            "[OrganizationStore] Auth token {}",
            if token.is_some() { "set" } else { "cleared" }
        );
        self.token.set(token);
    }

    pub fn auth_token(&self) -> Option<String> {
        self.token.get()
    }

    /// Replaces the collection with the full server list.
    pub async fn fetch_organizations(&self) -> Result<()> {
        let ticket = self.begin_list(None);
        let result = self.backend.list(self.token.get().as_deref()).await;
        self.finish_list(ticket, result)
    }

    /// Creates an organization and appends the server's record.
    pub async fn create_organization(&self, data: NewOrganization) -> Result<Organization> {
        let epoch = self.begin();
        let result = self
            .backend
            .create(self.token.get().as_deref(), &data)
            .await;
        self.finish(epoch, result, |state, created| {
            tracing::debug!("[OrganizationStore] Created organization {}", created.id);
            state.upsert(created.clone());
        })
    }

    /// Updates an organization in place, keeping its position.
    pub async fn update_organization(
        &self,
        id: &str,
        patch: OrganizationPatch,
    ) -> Result<Organization> {
        let epoch = self.begin();
        let result = self
            .backend
            .update(self.token.get().as_deref(), id, &patch)
            .await;
        self.finish(epoch, result, |state, updated| {
            tracing::debug!("[OrganizationStore] Updated organization {}", updated.id);
            state.replace(updated.clone());
        })
    }

    /// Deletes an organization and drops it from the cache.
    ///
    /// On failure the cached membership is unchanged.
    pub async fn delete_organization(&self, id: &str) -> Result<()> {
        let epoch = self.begin();
        let result = self.backend.delete(self.token.get().as_deref(), id).await;
        self.finish(epoch, result, |state, _| {
            tracing::debug!("[OrganizationStore] Deleted organization {}", id);
            state.remove(id);
        })
    }

    /// Server-side search.
    ///
    /// Records `query` as the current search query. A blank query lists the
    /// whole collection instead.
    pub async fn search_organizations(&self, query: &str) -> Result<()> {
        let ticket = self.begin_list(Some(query));
        let token = self.token.get();
        let result = if query.trim().is_empty() {
            self.backend.list(token.as_deref()).await
        } else {
            self.backend.search(token.as_deref(), query).await
        };
        self.finish_list(ticket, result)
    }

    /// Clears the search query and re-fetches the full collection.
    pub async fn clear_search(&self) -> Result<()> {
        self.state.send_modify(|state| state.search_query.clear());
        self.fetch_organizations().await
    }

    /// Local filter over the cached collection; see [`OrganizationState::filtered`].
    pub fn filtered_organizations(&self) -> Vec<Organization> {
        self.state.borrow().filtered()
    }

    pub fn set_selected_organization(&self, organization: Organization) {
        self.state
            .send_modify(|state| state.selected = Some(organization));
    }

    pub fn clear_selected_organization(&self) {
        self.state.send_modify(|state| state.selected = None);
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    /// Restores the empty initial state.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.list_generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(OrganizationState::default());
        tracing::debug!("[OrganizationStore] Reset");
    }

    // ============================================================================
    // Operation bookkeeping
    // ============================================================================

    fn begin(&self) -> u64 {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        self.epoch.load(Ordering::SeqCst)
    }

    fn begin_list(&self, query: Option<&str>) -> ListTicket {
        let generation = self.list_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            if let Some(query) = query {
                state.search_query = query.to_string();
            }
        });
        ListTicket {
            epoch: self.epoch.load(Ordering::SeqCst),
            generation,
        }
    }

    fn finish<T, F>(&self, epoch: u64, result: Result<T>, apply: F) -> Result<T>
    where
        F: FnOnce(&mut OrganizationState, &T),
    {
        let current = self.epoch.load(Ordering::SeqCst) == epoch;
        match result {
            Ok(value) => {
                self.state.send_modify(|state| {
                    if current {
                        apply(state, &value);
                    }
                    state.loading = false;
                });
                if !current {
                    tracing::debug!("[OrganizationStore] Discarding result from before reset");
                }
                Ok(value)
            }
            Err(e) => {
                self.fail(current, &e);
                Err(e)
            }
        }
    }

    fn finish_list(&self, ticket: ListTicket, result: Result<Vec<Organization>>) -> Result<()> {
        let current = self.epoch.load(Ordering::SeqCst) == ticket.epoch
            && self.list_generation.load(Ordering::SeqCst) == ticket.generation;
        match result {
            Ok(organizations) => {
                if !current {
                    tracing::debug!(
                        "[OrganizationStore] Discarding superseded list result (generation {})",
                        ticket.generation
                    );
                }
                self.state.send_modify(|state| {
                    if current {
                        state.replace_all(organizations);
                    }
                    state.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                self.fail(current, &e);
                Err(e)
            }
        }
    }

    fn fail(&self, current: bool, error: &OrgSyncError) {
        tracing::warn!("[OrganizationStore] Operation failed: {}", error);
        self.state.send_modify(|state| {
            if current {
                state.error = Some(error.to_string());
            }
            state.loading = false;
        });
    }
}

#[derive(Debug, Clone, Copy)]
struct ListTicket {
    epoch: u64,
    generation: u64,
}
