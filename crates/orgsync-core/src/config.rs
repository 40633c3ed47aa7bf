use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Organizations backend settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Identity provider settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: Option<String>,
    /// Public (anon) API key
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Keep the session in `session.json` between runs
    #[serde(default = "default_persist_session")]
    pub persist_session: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            persist_session: default_persist_session(),
        }
    }
}

fn default_persist_session() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [identity]
            url = "https://example.supabase.co"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.identity.url.as_deref(), Some("https://example.supabase.co"));
        assert!(config.identity.persist_session);
    }
}
