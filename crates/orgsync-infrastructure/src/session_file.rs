//! File persistence for the identity provider's session.

use orgsync_core::auth::Session;
use orgsync_core::error::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// JSON file holding the last issued session.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session.
    ///
    /// A missing file is `Ok(None)`. An unreadable or corrupt file is logged
    /// and also treated as no session, so a bad file never blocks sign-in.
    pub async fn load(&self) -> Result<Option<Session>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!(
                    "[SessionFile] Cannot read session file {:?}: {}",
                    self.path,
                    e
                );
                return Ok(None);
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(
                    "[SessionFile] Ignoring unreadable session file {:?}: {}",
                    self.path,
                    e
                );
                Ok(None)
            }
        }
    }

    /// Writes `session`, replacing any previous one.
    ///
    /// On unix the file is owner-only (0600) before any token is written to it.
    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(session)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;

        // `mode` only applies on creation; tighten a file left by older versions.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            file.set_permissions(permissions).await?;
        }

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
