//! host
//!
//! Capability interface to the editor host.
//!
//! # Design
//!
//! The commit layer consumes the surrounding editor through two narrow
//! traits: [`DocumentHost`] for the document itself (content, dirty flag,
//! status indicator) and [`Workspace`] for user interaction (notification,
//! confirmation, the three-way divergence choice). No dialog, terminal, or
//! other UI type appears in the commit layer's data model; the CLI's
//! console implementations live in [`console`].

pub mod console;

pub use console::{ConsoleDocumentHost, ConsoleWorkspace};

use async_trait::async_trait;
use thiserror::Error;

use crate::github::BlobContent;

/// Errors from the editor host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The document content could not be produced.
    #[error("{0}")]
    ContentUnavailable(String),
}

/// State of the commit indicator the host shows for the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A commit attempt is running.
    Loading,
    /// The last attempt committed successfully.
    Success,
}

/// The user's pick among the divergence remediations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionChoice {
    /// Create a uniquely named branch holding the user's version.
    FreshBranch,
    /// Force-move the original branch, discarding the divergence.
    Overwrite,
    /// Do nothing; the dangling commit stays unreferenced.
    Cancel,
}

/// The open document, as the commit layer sees it.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Current document content.
    async fn content(&self) -> Result<BlobContent, HostError>;

    /// Mark the document clean or dirty.
    fn set_dirty(&self, dirty: bool);

    /// Update the commit status indicator.
    fn set_status(&self, status: CommitStatus);
}

/// User-facing notification surface.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Informational dialog with an OK acknowledgement.
    async fn notify(&self, title: &str, body: &str);

    /// Yes/no confirmation. Returns true on yes.
    async fn confirm(&self, title: &str, body: &str) -> bool;

    /// The three-way divergence choice, shown with a link to the server's
    /// comparison view.
    async fn choose_resolution(&self, compare_url: &str) -> ResolutionChoice;
}
