//! Unified path management for orgsync files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/orgsync/           # Config directory (platform default)
//! ├── config.toml              # Backend and identity provider settings
//! └── session.json             # Identity provider session (when persisted)
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "orgsync";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution rooted either at the platform config directory or at an
/// explicit base (used by tests and `--config-dir`).
#[derive(Debug, Clone, Default)]
pub struct OrgSyncPaths {
    base: Option<PathBuf>,
}

impl OrgSyncPaths {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// Returns the orgsync configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: e.g. `~/.config/orgsync/`
    /// - `Err(PathError::ConfigDirNotFound)`: Could not determine directory
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the persisted identity session.
    ///
    /// # Security Note
    ///
    /// The file holds a refresh token and is written with 600 permissions on
    /// Unix.
    pub fn session_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("session.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_base() {
        let paths = OrgSyncPaths::new(Some(PathBuf::from("/tmp/orgsync-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/orgsync-test/config.toml")
        );
        assert_eq!(
            paths.session_file().unwrap(),
            PathBuf::from("/tmp/orgsync-test/session.json")
        );
    }
}
