//! Debounced server-side search.

use crate::organization_store::OrganizationStore;
use orgsync_core::error::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Quiet period between the last keystroke and the issued search.
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(300);

/// Delays searches until input has been quiet for a while.
///
/// Only the pending (not yet issued) search is replaceable. Once issued, a
/// search runs to completion on its own task; the store's generation check
/// decides whether its result still applies.
pub struct SearchDebouncer {
    store: Arc<OrganizationStore>,
    delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl SearchDebouncer {
    pub fn new(store: Arc<OrganizationStore>) -> Self {
        Self::with_delay(store, DEFAULT_SEARCH_DELAY)
    }

    pub fn with_delay(store: Arc<OrganizationStore>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a search for `query`, replacing any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&self, query: impl Into<String>) {
        let query = query.into();
        let token = self.replace_pending();
        let store = self.store.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            if store.state().search_query == query {
                tracing::debug!("[SearchDebouncer] Query unchanged; skipping");
                return;
            }

            let result = if query.trim().is_empty() {
                store.clear_search().await
            } else {
                tracing::debug!("[SearchDebouncer] Searching for {:?}", query);
                store.search_organizations(&query).await
            };
            // Already recorded in the store's `error`.
            if let Err(e) = result {
                tracing::debug!("[SearchDebouncer] Search for {:?} failed: {}", query, e);
            }
        });
    }

    /// Drops the pending search and clears the current one immediately.
    pub async fn clear(&self) -> Result<()> {
        self.cancel_pending();
        self.store.clear_search().await
    }

    /// Drops the pending search, if any, without issuing anything.
    pub fn cancel_pending(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = pending.take() {
            token.cancel();
        }
    }

    fn replace_pending(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(token.clone()) {
            previous.cancel();
        }
        token
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
