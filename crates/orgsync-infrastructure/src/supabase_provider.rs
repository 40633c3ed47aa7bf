//! SupabaseIdentityProvider - identity provider over the GoTrue auth REST API.
//!
//! Endpoints used (relative to the project URL):
//! - `POST /auth/v1/token?grant_type=password`
//! - `POST /auth/v1/token?grant_type=refresh_token`
//! - `POST /auth/v1/signup`
//! - `POST /auth/v1/logout`
//!
//! Every request carries the project's anon key in the `apikey` header.

use crate::session_file::SessionFile;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use orgsync_core::OrgSyncError;
use orgsync_core::auth::{
    AuthEvent, AuthStateChange, IdentityProvider, Session, SignUpOutcome, UserRef,
};
use orgsync_core::config::IdentityConfig;
use orgsync_core::error::Result;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

const FEED_CAPACITY: usize = 32;
/// Sessions expiring within this many seconds are refreshed before use.
const REFRESH_LEEWAY_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Sign-up answers with a full session when email confirmation is disabled,
/// and with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(GoTrueUser),
}

impl From<GoTrueUser> for UserRef {
    fn from(user: GoTrueUser) -> Self {
        UserRef {
            id: user.id,
            email: user.email,
        }
    }
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| {
                self.expires_in
                    .map(|secs| now + chrono::Duration::seconds(secs))
            });

        Session {
            user: self.user.into(),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

/// Extracts the provider's error message from a GoTrue error body.
///
/// GoTrue versions disagree on the field name, so the first of
/// `error_description`, `msg`, `message`, `error` that holds a string wins.
pub fn auth_error_message(status: u16, body: &str) -> String {
    let value = serde_json::from_str::<serde_json::Value>(body).ok();
    value
        .as_ref()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| {
                    value
                        .get(*key)
                        .and_then(|v| v.as_str())
                        .filter(|message| !message.is_empty())
                })
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Request failed with status code {}", status))
}

/// Identity provider backed by a Supabase project.
///
/// Keeps the current session in memory, optionally mirrored to a
/// [`SessionFile`], and publishes every change on a broadcast feed.
///
/// `get_session` refreshes a session that is about to expire. To keep a
/// long-lived session fresh without callers polling, start
/// [`spawn_auto_refresh`](Self::spawn_auto_refresh); it refreshes shortly
/// before `expires_at` and announces the result as `TokenRefreshed`.
pub struct SupabaseIdentityProvider {
    client: Client,
    url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    session_file: Option<SessionFile>,
    feed: broadcast::Sender<AuthStateChange>,
}

impl SupabaseIdentityProvider {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            client: Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            session: RwLock::new(None),
            session_file: None,
            feed,
        }
    }

    /// Builds a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns `OrgSyncError::Config` if the project URL or anon key is missing.
    pub async fn from_config(
        config: &IdentityConfig,
        session_file: Option<SessionFile>,
    ) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| OrgSyncError::config("identity provider URL is not configured"))?;
        let anon_key = config
            .anon_key
            .clone()
            .ok_or_else(|| OrgSyncError::config("identity provider anon key is not configured"))?;

        let provider = Self::new(url, anon_key);
        match session_file {
            Some(file) if config.persist_session => provider.with_session_file(file).await,
            _ => Ok(provider),
        }
    }

    /// Mirrors the session to `file`, restoring whatever it already holds.
    pub async fn with_session_file(mut self, file: SessionFile) -> Result<Self> {
        let restored = file.load().await?;
        if restored.is_some() {
            tracing::debug!(
                "[SupabaseIdentityProvider] Restored session from {:?}",
                file.path()
            );
        }
        *self.session.get_mut() = restored;
        self.session_file = Some(file);
        Ok(self)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn request(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.anon_key)
    }

    async fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(OrgSyncError::auth(auth_error_message(status.as_u16(), &body)))
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let request = self
            .request(self.client.post(self.endpoint("/token")))
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let response = Self::checked(request.send().await?).await?;
        let token = response.json::<TokenResponse>().await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Replaces the current session, mirrors it to disk and notifies the feed.
    async fn store_session(&self, session: Option<Session>, event: AuthEvent) {
        {
            let mut current = self.session.write().await;
            *current = session.clone();
        }

        if let Some(file) = &self.session_file {
            let persisted = match &session {
                Some(session) => file.save(session).await,
                None => file.clear().await,
            };
            if let Err(e) = persisted {
                tracing::warn!("[SupabaseIdentityProvider] Failed to persist session: {}", e);
            }
        }

        tracing::debug!("[SupabaseIdentityProvider] Auth state change: {:?}", event);
        // No receivers is not an error: nobody is listening yet.
        let _ = self.feed.send(AuthStateChange::new(event, session));
    }

    /// Time left until the current session is due for refresh, if it expires.
    async fn refresh_due_in(&self) -> Option<std::time::Duration> {
        let expires_at = self.session.read().await.as_ref()?.expires_at?;
        let due = expires_at - chrono::Duration::seconds(REFRESH_LEEWAY_SECS);
        // Negative means overdue.
        Some((due - Utc::now()).to_std().unwrap_or_default())
    }

    /// Refreshes the session in the background ahead of its expiry.
    ///
    /// The task re-plans on every change on the feed and ends once the
    /// provider is dropped. A failed refresh signs out, like `get_session`.
    pub fn spawn_auto_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let provider = Arc::downgrade(self);
        let mut feed = self.feed.subscribe();

        tokio::spawn(async move {
            loop {
                let due_in = match provider.upgrade() {
                    Some(provider) => provider.refresh_due_in().await,
                    None => break,
                };
                let due = async {
                    match due_in {
                        Some(due_in) => tokio::time::sleep(due_in).await,
                        None => std::future::pending().await,
                    }
                };

                tokio::select! {
                    _ = due => {
                        let Some(provider) = provider.upgrade() else {
                            break;
                        };
                        if let Err(e) = provider.get_session().await {
                            tracing::warn!("[SupabaseIdentityProvider] Scheduled refresh failed: {}", e);
                        }
                    }
                    change = feed.recv() => {
                        if let Err(broadcast::error::RecvError::Closed) = change {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("[SupabaseIdentityProvider] Auto refresh stopped");
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        tracing::debug!("[SupabaseIdentityProvider] Refreshing access token");
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>> {
        let current = self.session.read().await.clone();

        let session = match current {
            Some(session) if session.is_expired_at(Utc::now(), REFRESH_LEEWAY_SECS) => session,
            other => return Ok(other),
        };

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.store_session(None, AuthEvent::SignedOut).await;
            return Ok(None);
        };

        match self.refresh(refresh_token).await {
            Ok(refreshed) => {
                self.store_session(Some(refreshed.clone()), AuthEvent::TokenRefreshed)
                    .await;
                Ok(Some(refreshed))
            }
            Err(e) => {
                tracing::warn!("[SupabaseIdentityProvider] Token refresh failed: {}", e);
                self.store_session(None, AuthEvent::SignedOut).await;
                Err(e)
            }
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        self.store_session(Some(session.clone()), AuthEvent::SignedIn)
            .await;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let request = self
            .request(self.client.post(self.endpoint("/signup")))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let response = Self::checked(request.send().await?).await?;

        match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                self.store_session(Some(session.clone()), AuthEvent::SignedIn)
                    .await;
                Ok(SignUpOutcome {
                    user: Some(session.user.clone()),
                    session: Some(session),
                })
            }
            SignUpResponse::User(user) => Ok(SignUpOutcome {
                user: Some(user.into()),
                session: None,
            }),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let access_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone());

        if let Some(token) = access_token {
            let request = self
                .request(self.client.post(self.endpoint("/logout")))
                .bearer_auth(token);
            let response = request.send().await?;
            let status = response.status();
            // An already revoked session still counts as signed out.
            if !matches!(status, StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND) {
                Self::checked(response).await?;
            }
        }

        self.store_session(None, AuthEvent::SignedOut).await;
        Ok(())
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange> {
        self.feed.subscribe()
    }
}
