//! Organization domain module.
//!
//! # Module Structure
//!
//! - `model`: `Organization` and the request bodies sent to the backend
//! - `backend`: trait for the remote organizations resource
//! - `state`: observable state of the organization store

mod backend;
mod model;
mod state;

pub use backend::OrganizationBackend;
pub use model::{
    DESCRIPTION_MAX_CHARS, NAME_MAX_CHARS, NewOrganization, Organization, OrganizationPatch,
};
pub use state::OrganizationState;
