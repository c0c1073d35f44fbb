//! Session state: the bearer token and the cached user record.
//!
//! Values live in a [`Storage`] backend (in-memory or a JSON file under
//! `ENTRYDESK_HOME`). [`Session`] guards the backend with a mutex so a
//! login racing a 401 cleanup is applied in a deterministic order.
//! Tokens are never logged.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::{SessionBackend, SessionConfig, paths};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key for the JSON-serialized user record.
pub const USER_KEY: &str = "user";

/// Persistent string key-value store.
pub trait Storage: Send {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Process-local storage. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object on disk.
///
/// The file is loaded once on open and rewritten on every change with
/// restricted permissions (0600 on unix).
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session from {}", path.display()))?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse session from {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, items })
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(&self.items).context("Failed to serialize session")?;

        let tmp_path = self.path.with_extension("json.tmp");
        write_private(&tmp_path, contents.as_bytes())?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .with_context(|| format!("Failed to open {} for writing", path.display()))?;
        file.write_all(contents)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    }

    Ok(())
}

/// Shared handle to the session state.
///
/// Cloning is cheap; all clones see the same storage.
#[derive(Clone)]
pub struct Session {
    storage: Arc<Mutex<Box<dyn Storage>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Arc::new(Mutex::new(Box::new(storage))),
        }
    }

    /// A session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Opens the session backend selected in config.
    ///
    /// # Errors
    /// Returns an error if the session file cannot be loaded.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        match config.backend {
            SessionBackend::Memory => Ok(Self::in_memory()),
            SessionBackend::File => {
                let storage = FileStorage::open(paths::session_path())?;
                Ok(Self::new(storage))
            }
        }
    }

    // A panic while holding the lock cannot leave a half-written entry
    // behind: every Storage call is a single insert or remove.
    fn storage(&self) -> MutexGuard<'_, Box<dyn Storage>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the bearer token. An empty stored value counts as absent.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    pub fn token(&self) -> Result<Option<String>> {
        let token = self.storage().get(TOKEN_KEY)?;
        Ok(token.filter(|t| !t.is_empty()))
    }

    /// # Errors
    /// Returns an error if the backend cannot be written.
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.storage().set(TOKEN_KEY, token)
    }

    /// # Errors
    /// Returns an error if the backend cannot be written.
    pub fn clear_token(&self) -> Result<()> {
        self.storage().remove(TOKEN_KEY)
    }

    /// Returns the cached user record.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read or the stored value is
    /// not valid JSON.
    pub fn user(&self) -> Result<Option<Value>> {
        let Some(raw) = self.storage().get(USER_KEY)? else {
            return Ok(None);
        };
        let user: Value = serde_json::from_str(&raw).context("Failed to parse cached user")?;
        Ok(Some(user).filter(|u| !u.is_null()))
    }

    /// # Errors
    /// Returns an error if the backend cannot be written.
    pub fn set_user(&self, user: &Value) -> Result<()> {
        let raw = serde_json::to_string(user).context("Failed to serialize user")?;
        self.storage().set(USER_KEY, &raw)
    }

    /// Returns the `id` field of the cached user, if both exist.
    ///
    /// # Errors
    /// Same as [`Session::user`].
    pub fn user_id(&self) -> Result<Option<Value>> {
        Ok(self
            .user()?
            .and_then(|user| user.get("id").cloned())
            .filter(|id| !id.is_null()))
    }
}
