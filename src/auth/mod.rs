//! auth - GitHub credential handling
//!
//! Scrivener authenticates with either a personal access token or basic
//! username/password credentials, matching what the GitHub API accepts for
//! the Git Data endpoints. The transport consumes credentials exclusively
//! through the [`CredentialProvider`] trait, so the commit layer never
//! sees a token.
//!
//! # Components
//!
//! - [`Credentials`] - The stored record (`{token}` or `{username,
//!   password}`)
//! - [`CredentialStore`] - Persistence over [`SecretStore`] plus the
//!   `CredentialProvider` implementation
//!
//! # Security
//!
//! Credential values MUST never appear in:
//! - logs (including --debug)
//! - error messages
//! - `Debug` output
//!
//! All types in this module implement custom `Debug` to redact values.
//!
//! [`SecretStore`]: crate::secrets::SecretStore

mod credentials;

pub use credentials::{CredentialStore, Credentials, CREDENTIALS_KEY};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from credential operations.
///
/// Error messages intentionally do not include credential values.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credentials are stored. Run 'scriv auth login'.
    #[error("no credentials stored. Run 'scriv auth login'.")]
    NotConfigured,

    /// The stored record could not be parsed.
    #[error("stored credentials are invalid: {0}")]
    Invalid(String),

    /// Error from the underlying secret store.
    #[error("secret store error: {0}")]
    Storage(String),
}

/// Trait providing `Authorization` header values to the transport.
///
/// Implementors must:
/// - Return a complete header value (`token ...` or `Basic ...`)
/// - Never log or expose the value
/// - Support invalidation, used when the server answers 401
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Produce the `Authorization` header value.
    async fn authorization(&self) -> Result<String, CredentialError>;

    /// Discard stored credentials so the next attempt re-authenticates.
    fn invalidate(&self);
}
