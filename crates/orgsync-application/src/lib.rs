//! Application layer for orgsync.
//!
//! Holds the two observable stores and the glue between them:
//!
//! - [`SessionStore`]: who is signed in, driven by the identity provider
//! - [`OrganizationStore`]: the cached organization collection
//! - [`Orchestrator`]: forwards session changes into the organization store
//! - [`SearchDebouncer`]: delays search input before hitting the backend
//! - [`AppContext`]: composition root wiring all of the above

pub mod context;
pub mod orchestrator;
pub mod organization_store;
pub mod search_debouncer;
pub mod session_store;

pub use context::AppContext;
pub use orchestrator::{Orchestrator, OrchestratorHandle};
pub use organization_store::OrganizationStore;
pub use search_debouncer::{DEFAULT_SEARCH_DELAY, SearchDebouncer};
pub use session_store::{SessionNotice, SessionStore};
