use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Non-secret record of the signed-in user. The refresh token is kept in
/// the keychain, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub uid: UserId,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn new(uid: UserId, email: Option<String>) -> Self {
        Self {
            uid,
            email,
            created_at: Utc::now(),
        }
    }

    /// Days since this user last signed in with a password
    pub fn age_days(&self) -> i64 {
        (Utc::now() - self.created_at).num_days().max(0)
    }
}

/// On-disk record of who was signed in when the process last ran.
pub struct SessionFile {
    cache_dir: PathBuf,
}

impl SessionFile {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Load the stored user, if a session file exists
    pub fn load(&self) -> Result<Option<StoredUser>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let user = serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(user))
    }

    pub fn save(&self, user: &StoredUser) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(user)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}
