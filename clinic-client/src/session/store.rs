//! Persistence of the session between runs.
//!
//! The access token, renewal token, role and display name are stored and
//! cleared together.

use crate::models::{Credential, Role};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl From<&Credential> for PersistedSession {
    fn from(credential: &Credential) -> Self {
        Self {
            access_token: credential.access_token().to_string(),
            refresh_token: credential.refresh_token().map(str::to_string),
            role: credential.role(),
            display_name: credential.display_name().map(str::to_string),
        }
    }
}

impl From<PersistedSession> for Credential {
    fn from(session: PersistedSession) -> Self {
        let mut credential = Credential::new(session.access_token, session.role);
        if let Some(refresh_token) = session.refresh_token {
            credential = credential.with_refresh_token(refresh_token);
        }
        if let Some(display_name) = session.display_name {
            credential = credential.with_display_name(display_name);
        }
        credential
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<PersistedSession>>;
    async fn save(&self, session: &PersistedSession) -> anyhow::Result<()>;
    async fn clear(&self) -> anyhow::Result<()>;
}

/// Session kept for the lifetime of the process only.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<PersistedSession>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> anyhow::Result<Option<PersistedSession>> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &PersistedSession) -> anyhow::Result<()> {
        *self.session.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.session.lock().await = None;
        Ok(())
    }
}

/// Session kept in a JSON file, surviving restarts.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> anyhow::Result<Option<PersistedSession>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read session file {}", self.path.display()));
            }
        };

        let session = serde_json::from_slice(&contents)
            .with_context(|| format!("Corrupt session file {}", self.path.display()))?;

        Ok(Some(session))
    }

    async fn save(&self, session: &PersistedSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_vec_pretty(session)?;
        let staging = self.path.with_extension("tmp");

        tokio::fs::write(&staging, contents)
            .await
            .with_context(|| format!("Failed to write {}", staging.display()))?;

        // Bearer and refresh tokens: owner-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("Failed to restrict {}", staging.display()))?;
        }

        tokio::fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file {}", self.path.display())),
        }
    }
}
