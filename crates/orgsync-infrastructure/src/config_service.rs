//! Configuration service implementation.
//!
//! Loads `AppConfig` from config.toml and applies environment overrides.
//!
//! Priority: environment variables > config.toml > defaults

use crate::paths::OrgSyncPaths;
use orgsync_core::OrgSyncError;
use orgsync_core::config::AppConfig;
use orgsync_core::error::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub const ENV_API_URL: &str = "ORGSYNC_API_URL";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";

/// Configuration service that loads and caches the application configuration.
///
/// A missing config file is not an error: defaults are used and nothing is
/// written to disk.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration, filled on first access.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService reading the config file under `paths`.
    pub fn new(paths: &OrgSyncPaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| OrgSyncError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading it if not cached.
    pub fn get_config(&self) -> Result<AppConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = Self::load_file(&self.path)?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        tracing::debug!(
            "[ConfigService] Loaded config from {:?}: api={}, identity configured={}",
            self.path,
            loaded.api.base_url,
            loaded.identity.url.is_some()
        );

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn load_file(path: &Path) -> Result<AppConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[ConfigService] {:?} not found, using defaults", path);
                Ok(AppConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Overrides file values with environment variables.
///
/// `lookup` abstracts `std::env::var` so precedence can be tested without
/// touching the process environment. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = lookup(ENV_API_URL) {
        config.api.base_url = url;
    }
    if let Some(url) = lookup(ENV_SUPABASE_URL) {
        config.identity.url = Some(url);
    }
    if let Some(key) = lookup(ENV_SUPABASE_ANON_KEY) {
        config.identity.anon_key = Some(key);
    }
}
