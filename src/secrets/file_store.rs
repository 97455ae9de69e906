//! secrets::file_store
//!
//! File-backed secret storage.
//!
//! # Security
//!
//! The store is a TOML map at `~/.scrivener/secrets.toml`. Writes go
//! through a temp file that is chmodded 0600 before any content lands on
//! disk, then renamed into place, all under an exclusive advisory lock so
//! two processes cannot interleave a read-modify-write.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use fs2::FileExt;

use super::traits::{SecretError, SecretStore};

/// The default, file-backed secret store.
#[derive(Debug)]
pub struct FileSecretStore {
    /// Location of the secrets file
    path: PathBuf,
}

impl FileSecretStore {
    /// Open the store at its default location,
    /// `~/.scrivener/secrets.toml`.
    ///
    /// # Errors
    ///
    /// Fails when no home directory can be determined.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("no home directory".into()))?;
        Ok(Self {
            path: home.join(".scrivener").join("secrets.toml"),
        })
    }

    /// Open the store at an explicit path (used by tests).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Location of the secrets file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the whole map; an absent file is an empty map.
    fn load_map(&self) -> Result<HashMap<String, String>, SecretError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| SecretError::ReadError(e.to_string()))
    }

    /// Persist the whole map: lock, write a 0600 temp file, rename.
    fn store_map(&self, map: &HashMap<String, String>) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SecretError::WriteError(e.to_string()))?;
        }

        let _lock = self.lock()?;

        let rendered =
            toml::to_string_pretty(map).map_err(|e| SecretError::WriteError(e.to_string()))?;

        let staging = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&staging)
                .map_err(|e| SecretError::WriteError(e.to_string()))?;

            // Owner-only before a single secret byte is written.
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(e.to_string()))?;

            file.write_all(rendered.as_bytes())
                .map_err(|e| SecretError::WriteError(e.to_string()))?;
            file.sync_all()
                .map_err(|e| SecretError::WriteError(e.to_string()))?;
        }

        fs::rename(&staging, &self.path).map_err(|e| SecretError::WriteError(e.to_string()))
    }

    /// Take the advisory lock guarding writers.
    fn lock(&self) -> Result<LockGuard, SecretError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.path.with_extension("lock"))
            .map_err(|e| SecretError::LockError(e.to_string()))?;
        file.lock_exclusive()
            .map_err(|e| SecretError::LockError(e.to_string()))?;
        Ok(LockGuard { file })
    }
}

/// Holds the advisory lock; released on drop.
struct LockGuard {
    file: fs::File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.load_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut map = self.load_map()?;
        map.insert(key.to_string(), value.to_string());
        self.store_map(&map)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let mut map = self.load_map()?;
        if map.remove(key).is_some() {
            self.store_map(&map)?;
        }
        Ok(())
    }
}
