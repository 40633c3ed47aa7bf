//! HttpOrganizationBackend - REST client for the organizations resource.

use async_trait::async_trait;
use orgsync_core::OrgSyncError;
use orgsync_core::error::Result;
use orgsync_core::organization::{
    NewOrganization, Organization, OrganizationBackend, OrganizationPatch,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Organization backend speaking JSON over HTTP.
///
/// Requests carry `Authorization: Bearer <token>` when the caller passes a
/// token. No timeout is set: a hung request stays pending.
#[derive(Clone)]
pub struct HttpOrganizationBackend {
    client: Client,
    base_url: String,
}

impl HttpOrganizationBackend {
    /// Creates a backend rooted at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the bearer credential, if any.
    fn auth_request(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = Self::checked(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        Self::checked(request.send().await?).await?;
        Ok(())
    }

    async fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status.as_u16(), &body);
        tracing::debug!(
            "[HttpOrganizationBackend] Request failed: status={}, message={}",
            status,
            message
        );
        Err(OrgSyncError::backend(status.as_u16(), message))
    }
}

/// Extracts a human-readable message from an error response body.
///
/// A string `detail` is used verbatim; any other `detail` value is rendered
/// as JSON text. Without a `detail`, the generic status message is used.
pub fn error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());

    match detail {
        Some(serde_json::Value::String(message)) if !message.is_empty() => message,
        Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
            format!("Request failed with status code {}", status)
        }
        Some(other) => other.to_string(),
    }
}

#[async_trait]
impl OrganizationBackend for HttpOrganizationBackend {
    async fn list(&self, token: Option<&str>) -> Result<Vec<Organization>> {
        tracing::debug!("[HttpOrganizationBackend] GET /organizations");
        let request = self.auth_request(self.client.get(self.url("/organizations")), token);
        self.send_json(request).await
    }

    async fn create(&self, token: Option<&str>, data: &NewOrganization) -> Result<Organization> {
        tracing::debug!("[HttpOrganizationBackend] POST /organizations");
        let request = self
            .auth_request(self.client.post(self.url("/organizations")), token)
            .json(data);
        self.send_json(request).await
    }

    async fn update(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &OrganizationPatch,
    ) -> Result<Organization> {
        tracing::debug!("[HttpOrganizationBackend] PUT /organizations/{}", id);
        let path = format!("/organizations/{}", urlencoding::encode(id));
        let request = self
            .auth_request(self.client.put(self.url(&path)), token)
            .json(patch);
        self.send_json(request).await
    }

    async fn delete(&self, token: Option<&str>, id: &str) -> Result<()> {
        tracing::debug!("[HttpOrganizationBackend] DELETE /organizations/{}", id);
        let path = format!("/organizations/{}", urlencoding::encode(id));
        let request = self.auth_request(self.client.delete(self.url(&path)), token);
        self.send_empty(request).await
    }

    async fn search(&self, token: Option<&str>, query: &str) -> Result<Vec<Organization>> {
        let path = format!("/organizations/search/{}", urlencoding::encode(query));
        tracing::debug!("[HttpOrganizationBackend] GET {}", path);
        let request = self.auth_request(self.client.get(self.url(&path)), token);
        self.send_json(request).await
    }
}
