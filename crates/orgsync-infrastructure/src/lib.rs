//! Infrastructure layer for orgsync.
//!
//! Concrete implementations of the core traits against real services, plus
//! configuration and path management.

pub mod config_service;
pub mod http_backend;
pub mod paths;
pub mod session_file;
pub mod supabase_provider;

pub use crate::config_service::ConfigService;
pub use crate::http_backend::HttpOrganizationBackend;
pub use crate::paths::OrgSyncPaths;
pub use crate::session_file::SessionFile;
pub use crate::supabase_provider::SupabaseIdentityProvider;
