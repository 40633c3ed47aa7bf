//! Hand-written mocks shared by the application tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use orgsync_core::OrgSyncError;
use orgsync_core::auth::{
    AuthEvent, AuthStateChange, IdentityProvider, Session, SignUpOutcome, UserRef,
};
use orgsync_core::error::Result;
use orgsync_core::organization::{
    NewOrganization, Organization, OrganizationBackend, OrganizationPatch,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

pub const TOKEN: &str = "token-1";

pub fn org(id: &str, name: &str, description: &str) -> Organization {
    Organization {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        is_active: true,
        created_at: Utc::now(),
        user_id: Some("user-1".to_string()),
        updated_at: None,
    }
}

pub fn session(access_token: &str) -> Session {
    Session {
        user: UserRef {
            id: "user-1".to_string(),
            email: Some("a@example.com".to_string()),
        },
        access_token: access_token.to_string(),
        refresh_token: None,
        expires_at: None,
    }
}

/// Recorded backend call: operation name, argument, bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub arg: String,
    pub token: Option<String>,
}

/// In-memory organizations backend that only accepts [`TOKEN`].
pub struct MockBackend {
    organizations: Mutex<Vec<Organization>>,
    next_id: Mutex<u32>,
    calls: Mutex<Vec<Call>>,
    /// Artificial latency per search query (or "" for list)
    delays: Mutex<HashMap<String, Duration>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_organizations(Vec::new())
    }

    pub fn with_organizations(organizations: Vec<Organization>) -> Self {
        Self {
            next_id: Mutex::new(organizations.len() as u32),
            organizations: Mutex::new(organizations),
            calls: Mutex::new(Vec::new()),
            delays: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_delay(&self, key: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(key.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, op: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    fn record(&self, op: &'static str, arg: &str, token: Option<&str>) -> Result<()> {
        self.calls.lock().unwrap().push(Call {
            op,
            arg: arg.to_string(),
            token: token.map(str::to_string),
        });
        if token == Some(TOKEN) {
            Ok(())
        } else {
            Err(OrgSyncError::backend(401, "Not authenticated"))
        }
    }

    async fn latency(&self, key: &str) {
        let delay = self.delays.lock().unwrap().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl OrganizationBackend for MockBackend {
    async fn list(&self, token: Option<&str>) -> Result<Vec<Organization>> {
        self.record("list", "", token)?;
        self.latency("").await;
        Ok(self.organizations.lock().unwrap().clone())
    }

    async fn create(&self, token: Option<&str>, data: &NewOrganization) -> Result<Organization> {
        self.record("create", &data.name, token)?;
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            next.to_string()
        };
        let created = org(&id, &data.name, &data.description);
        self.organizations.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &OrganizationPatch,
    ) -> Result<Organization> {
        self.record("update", id, token)?;
        let mut organizations = self.organizations.lock().unwrap();
        let record = organizations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| OrgSyncError::backend(404, "Organization not found"))?;
        if let Some(name) = &patch.name {
            record.name = name.clone();
        }
        if let Some(description) = &patch.description {
            record.description = description.clone();
        }
        if let Some(is_active) = patch.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, token: Option<&str>, id: &str) -> Result<()> {
        self.record("delete", id, token)?;
        let mut organizations = self.organizations.lock().unwrap();
        let before = organizations.len();
        organizations.retain(|o| o.id != id);
        if organizations.len() == before {
            return Err(OrgSyncError::backend(404, "Organization not found"));
        }
        Ok(())
    }

    async fn search(&self, token: Option<&str>, query: &str) -> Result<Vec<Organization>> {
        self.record("search", query, token)?;
        self.latency(query).await;
        let needle = query.to_lowercase();
        Ok(self
            .organizations
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

/// Identity provider accepting the password "secret".
pub struct MockProvider {
    session: Mutex<Option<Session>>,
    feed: broadcast::Sender<AuthStateChange>,
    get_session_error: Mutex<Option<String>>,
    sign_out_error: Mutex<Option<String>>,
    subscriptions: Mutex<u32>,
}

impl MockProvider {
    pub fn new(session: Option<Session>) -> Self {
        let (feed, _) = broadcast::channel(16);
        Self {
            session: Mutex::new(session),
            feed,
            get_session_error: Mutex::new(None),
            sign_out_error: Mutex::new(None),
            subscriptions: Mutex::new(0),
        }
    }

    pub fn failing_get_session(message: &str) -> Self {
        let provider = Self::new(None);
        *provider.get_session_error.lock().unwrap() = Some(message.to_string());
        provider
    }

    pub fn fail_sign_out(&self, message: &str) {
        *self.sign_out_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn subscriptions(&self) -> u32 {
        *self.subscriptions.lock().unwrap()
    }

    /// Pushes a change as if it came from elsewhere (refresh, another tab).
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        *self.session.lock().unwrap() = session.clone();
        let _ = self.feed.send(AuthStateChange::new(event, session));
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn get_session(&self) -> Result<Option<Session>> {
        if let Some(message) = self.get_session_error.lock().unwrap().clone() {
            return Err(OrgSyncError::transport(message));
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, _email: &str, password: &str) -> Result<Session> {
        if password != "secret" {
            return Err(OrgSyncError::auth("Invalid login credentials"));
        }
        let session = session(TOKEN);
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpOutcome> {
        Ok(SignUpOutcome {
            user: Some(UserRef {
                id: "user-2".to_string(),
                email: Some(email.to_string()),
            }),
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(message) = self.sign_out_error.lock().unwrap().clone() {
            return Err(OrgSyncError::auth(message));
        }
        *self.session.lock().unwrap() = None;
        Ok(())
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange> {
        *self.subscriptions.lock().unwrap() += 1;
        self.feed.subscribe()
    }
}

/// Polls `condition` until it holds or a second has passed.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
