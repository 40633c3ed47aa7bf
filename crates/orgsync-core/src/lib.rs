//! Domain layer for orgsync.
//!
//! Holds the models shared by every other crate, the error type, and the
//! traits behind which the two remote collaborators live:
//!
//! - [`auth::IdentityProvider`]: issues and revokes sessions
//! - [`organization::OrganizationBackend`]: the organizations REST resource

pub mod auth;
pub mod config;
pub mod error;
pub mod organization;

// Re-export common error type
pub use error::OrgSyncError;
