//! Credential persistence abstraction.
//!
//! The manager reads the persisted credential on every call and writes back every
//! credential it mints. [`FileCredentialStore`] keeps the broker's token JSON in the
//! user's home directory; [`MemoryCredentialStore`] is for embedding and tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::error::CredentialError;
use super::types::Credential;

/// File name of the token file under the home directory.
pub const TOKEN_FILE_NAME: &str = ".questrade_token.json";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted credential, `None` when nothing is stored.
    async fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// Replace the persisted credential.
    async fn save(&self, credential: &Credential) -> Result<(), CredentialError>;
}

/// JSON file-backed credential store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.questrade_token.json`.
    pub fn in_home_dir() -> Result<Self, CredentialError> {
        let home = dirs::home_dir()
            .ok_or_else(|| CredentialError::Internal("Cannot determine home directory".into()))?;
        Ok(Self::new(home.join(TOKEN_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored credential");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        let credential = serde_json::from_str(&contents)?;
        Ok(Some(credential))
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        let json = serde_json::to_string_pretty(credential)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write next to the target and rename so a crash never leaves a torn file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
    saves: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Current contents without going through the async trait.
    pub fn snapshot(&self) -> Option<Credential> {
        self.credential.lock().clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(self.credential.lock().clone())
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        *self.credential.lock() = Some(credential.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
