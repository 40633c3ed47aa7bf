use super::model::Organization;
use serde::{Deserialize, Serialize};

/// Observable state of the organization store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationState {
    /// Cached collection, in fetch/insertion order, ids unique
    pub organizations: Vec<Organization>,
    /// Coarse in-flight indicator shared by every operation
    pub loading: bool,
    /// Message of the last failed operation
    pub error: Option<String>,
    /// Query of the last requested search (empty when not searching)
    pub search_query: String,
    pub selected: Option<Organization>,
}

impl OrganizationState {
    /// Local, case-insensitive filter over the cached collection.
    ///
    /// Returns everything when `search_query` is blank. Independent of any
    /// server-side search.
    pub fn filtered(&self) -> Vec<Organization> {
        if self.search_query.trim().is_empty() {
            return self.organizations.clone();
        }

        let needle = self.search_query.to_lowercase();
        self.organizations
            .iter()
            .filter(|org| org.matches_lowercase(&needle))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&Organization> {
        self.organizations.iter().find(|org| org.id == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_ref().is_some_and(|org| org.id == id)
    }

    /// Replaces the collection, keeping the first record for any repeated id.
    pub fn replace_all(&mut self, organizations: Vec<Organization>) {
        let mut unique: Vec<Organization> = Vec::with_capacity(organizations.len());
        for org in organizations {
            if !unique.iter().any(|existing| existing.id == org.id) {
                unique.push(org);
            }
        }
        self.organizations = unique;
    }

    /// Appends a record, or replaces it in place if the id is already cached.
    pub fn upsert(&mut self, organization: Organization) {
        match self
            .organizations
            .iter_mut()
            .find(|existing| existing.id == organization.id)
        {
            Some(existing) => *existing = organization,
            None => self.organizations.push(organization),
        }
    }

    /// Replaces the record with the same id in place; also refreshes `selected`.
    pub fn replace(&mut self, organization: Organization) {
        if let Some(existing) = self
            .organizations
            .iter_mut()
            .find(|existing| existing.id == organization.id)
        {
            *existing = organization.clone();
        }
        if self.is_selected(&organization.id) {
            self.selected = Some(organization);
        }
    }

    /// Removes the record with `id`; clears `selected` if it matched.
    pub fn remove(&mut self, id: &str) {
        self.organizations.retain(|org| org.id != id);
        if self.is_selected(id) {
            self.selected = None;
        }
    }
}
