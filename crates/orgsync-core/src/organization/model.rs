//! Organization domain model.
//!
//! Mirrors the resource served by the backend under `/organizations`.

use crate::error::{OrgSyncError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum length of an organization name, in characters.
pub const NAME_MAX_CHARS: usize = 100;
/// Maximum length of an organization description, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// An organization record as returned by the backend.
///
/// Ids are assigned server-side. The backend serialises them as integers,
/// but they are opaque to the client and held as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Owner of the record (the authenticated user's id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// Returns true if `needle` (already lowercased) occurs in the name or
    /// the description, ignoring case.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}

/// Body of a create request.
///
/// `is_active` is left to the server default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub description: String,
}

impl NewOrganization {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Required-field and length checks performed by the view layer before
    /// calling the store.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_description(&self.description)
    }
}

/// Partial update body.
///
/// Absent fields are omitted from the JSON body entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl OrganizationPatch {
    /// Payload of the edit form: name and description are always sent, even
    /// when unchanged; `is_active` only when the caller supplies it.
    pub fn edit(
        name: impl Into<String>,
        description: impl Into<String>,
        is_active: Option<bool>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
            is_active,
        }
    }

    /// Payload of the activate/deactivate toggle.
    pub fn set_active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_active.is_none()
    }

    /// Checks the fields that are present.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(OrgSyncError::validation("No fields to update"));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(OrgSyncError::validation("Organization name is required"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(OrgSyncError::validation(format!(
            "Organization name must be {} characters or less",
            NAME_MAX_CHARS
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    let len = description.trim().chars().count();
    if len == 0 {
        return Err(OrgSyncError::validation("Description is required"));
    }
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(OrgSyncError::validation(format!(
            "Description must be {} characters or less",
            DESCRIPTION_MAX_CHARS
        )));
    }
    Ok(())
}
