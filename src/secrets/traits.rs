//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! # Design
//!
//! A [`SecretStore`] is a flat key/value map with namespaced keys
//! ("github.credentials"). The commit and auth layers only ever talk to
//! the trait, so where secrets live is a deployment detail.
//!
//! # Security
//!
//! No implementation may let a secret value reach a log line, an error
//! message, or `Debug` output. Error variants therefore carry only
//! operational context, never the value involved.

use thiserror::Error;

/// Errors from secret storage operations. Values are never included.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The store could not be read.
    #[error("secret store read failed: {0}")]
    ReadError(String),

    /// The store could not be written.
    #[error("secret store write failed: {0}")]
    WriteError(String),

    /// A key could not be removed.
    #[error("secret store delete failed: {0}")]
    DeleteError(String),

    /// The store could not be locked against concurrent writers.
    #[error("secret store lock failed: {0}")]
    LockError(String),
}

/// Key/value storage for secrets.
///
/// Implementations must be `Send + Sync` and must keep secret values out
/// of every error path.
pub trait SecretStore: Send + Sync {
    /// Read the value for `key`; `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Remove `key`. Removing an absent key succeeds, so delete is
    /// idempotent.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Whether `key` has a stored value.
    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}
