//! Login state, passed explicitly to the commands that need it.
//!
//! The marker is a small JSON file under the data directory. It records
//! who logged in and when; it holds no credentials.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Session file is corrupt: {0}")]
    Corrupt(String),
    #[error("Session file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub authenticated: bool,
    pub username: Option<String>,
    #[serde(default)]
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logged_in(username: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            username: Some(username.into()),
            logged_in_at: Some(Utc::now()),
        }
    }

    /// Read the marker. A missing file means nobody is logged in.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::anonymous()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text).map_err(|e| SessionError::Corrupt(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SessionError::Corrupt(e.to_string()))?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), authenticated = self.authenticated, "Session saved");
        Ok(())
    }

    /// Remove the marker; a missing file is not an error.
    pub fn clear(path: &Path) -> Result<(), SessionError> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Username of the logged-in user, or `NotAuthenticated`.
    pub fn require_user(&self) -> Result<&str, SessionError> {
        match (&self.username, self.authenticated) {
            (Some(name), true) if !name.is_empty() => Ok(name),
            _ => Err(SessionError::NotAuthenticated),
        }
    }
}
