//! Organization backend trait.
//!
//! Defines the interface to the remote organizations collection.

use super::model::{NewOrganization, Organization, OrganizationPatch};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract client for the organizations REST resource.
///
/// Every call receives the bearer token to attach, if any. A `None` token
/// means the request is sent unauthenticated and the backend is expected to
/// reject it.
///
/// # Error contract
///
/// - A structured error body yields `OrgSyncError::Backend` whose message is
///   the body's message, verbatim.
/// - A failure without a response yields `OrgSyncError::Transport`.
#[async_trait]
pub trait OrganizationBackend: Send + Sync {
    /// `GET /organizations`
    async fn list(&self, token: Option<&str>) -> Result<Vec<Organization>>;

    /// `POST /organizations`
    async fn create(&self, token: Option<&str>, data: &NewOrganization) -> Result<Organization>;

    /// `PUT /organizations/{id}`
    async fn update(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &OrganizationPatch,
    ) -> Result<Organization>;

    /// `DELETE /organizations/{id}`
    async fn delete(&self, token: Option<&str>, id: &str) -> Result<()>;

    /// `GET /organizations/search/{query}`; the implementation escapes the query.
    async fn search(&self, token: Option<&str>, query: &str) -> Result<Vec<Organization>>;
}
