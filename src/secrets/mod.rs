//! secrets
//!
//! Secret storage abstraction.
//!
//! # Design
//!
//! Credentials are persisted through the [`SecretStore`] trait so nothing
//! above this module knows where secrets live. The default provider is a
//! file store under `~/.scrivener`; an in-memory store exists for tests.
//!
//! Secret values must never appear in logs, errors, or `Debug` output.

pub mod file_store;
pub mod traits;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Create the default secret store.
pub fn create_store() -> Result<Arc<dyn SecretStore>, SecretError> {
    Ok(Arc::new(FileSecretStore::new()?))
}

/// In-memory secret store for tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySecretStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}
