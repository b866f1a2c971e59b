//! # Session Store
//!
//! Persists the logged-in session (auth token, account type and user data)
//! as a single JSON file, the desktop counterpart of the browser's local
//! storage.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "authToken": "eyJhbGciOi...",
//!   "userType": "paciente",
//!   "userData": { "id": 41, "nome": "Ana", "nutricionista": true }
//! }
//! ```
//!
//! Writes go to a temp file first and are renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::{SessionUser, UserType};
use tracing::{debug, info};

/// The authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "authToken")]
    pub auth_token: String,
    #[serde(rename = "userType")]
    pub user_type: UserType,
    #[serde(rename = "userData")]
    pub user: SessionUser,
}

impl Session {
    /// Patient id used when creating bookings
    pub fn patient_id(&self) -> i64 {
        self.user.id
    }
}

/// File-backed session storage
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session; a missing file means nobody is logged in
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            debug!("No session file at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {:?}", self.path))?;
        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file {:?}", self.path))?;
        Ok(Some(session))
    }

    /// Persist the session, replacing any previous one
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create session directory {:?}", parent))?;
            }
        }

        let json = serde_json::to_string_pretty(session)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write session file {:?}", temp_path))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to move session file into {:?}", self.path))?;

        info!("💾 Session saved for user {}", session.user.id);
        Ok(())
    }

    /// Remove the stored session (logout, expired token)
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("🔒 Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove session file {:?}", self.path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_session;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_and_load_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().join("nested").join("session.json"));
        let session = sample_session();

        store.save(&session).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, session);
        assert_eq!(loaded.patient_id(), 41);
        assert!(loaded.user.covers_category("nutricionista"));
    }

    #[test]
    fn test_clear_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));

        store.save(&sample_session()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_load_reads_browser_shaped_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        fs::write(
            &path,
            concat!(
                r#"{"authToken":"t","userType":"paciente","#,
                r#""userData":{"id":7,"nome":"Bia","personal-trainer":true}}"#,
            ),
        )
        .unwrap();

        let session = SessionStore::new(&path).load().unwrap().unwrap();
        assert_eq!(session.user_type, UserType::Patient);
        assert_eq!(session.patient_id(), 7);
        assert!(session.user.covers_category("personal-trainer"));
    }

    #[test]
    fn test_load_corrupt_session_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(SessionStore::new(&path).load().is_err());
    }
}
