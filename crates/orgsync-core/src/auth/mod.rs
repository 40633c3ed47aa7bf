//! Authentication domain module.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `UserRef` and the provider change-feed types
//! - `provider`: `IdentityProvider` trait
//! - `state`: observable session state and the events emitted on change
//! - `token`: shared bearer-token slot

mod model;
mod provider;
mod state;
mod token;

pub use model::{AuthEvent, AuthStateChange, Session, SignUpOutcome, UserRef};
pub use provider::IdentityProvider;
pub use state::{SessionEvent, SessionState};
pub use token::BearerToken;
