//! Scrivener - commit edited documents into GitHub repositories
//!
//! Scrivener opens a file that lives in a GitHub repository, hands its
//! content to an editor, and commits the edited result back through the
//! low-level Git Data API (blobs, trees, commits, refs) instead of the
//! Contents API. Going through raw objects lets every commit be validated
//! for fast-forward safety before any branch pointer moves, and lets
//! conflicts be put in front of a human instead of silently resolved.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the
//!   commit layer)
//! - [`commit`] - Session, fast-forward guard, commit pipeline, and the
//!   conflict/access resolver
//! - [`github`] - Object store abstraction over the Git Data API (REST and
//!   mock implementations)
//! - [`host`] - Capability interface to the editor host (content, dirty
//!   flag, dialogs)
//! - [`auth`] - Credential records and the provider seam used by the
//!   transport
//! - [`secrets`] - Secret storage abstraction
//! - [`config`] - Configuration loading
//! - [`ui`] - Console output and prompts
//!
//! # Correctness Invariants
//!
//! Scrivener maintains the following invariants:
//!
//! 1. No ref targeting the original branch moves while a divergence is
//!    unresolved
//! 2. Git objects are only ever created, never mutated
//! 3. Session state advances only after a ref move is confirmed successful
//! 4. At most one commit attempt is in flight per open document

pub mod auth;
pub mod cli;
pub mod commit;
pub mod config;
pub mod github;
pub mod host;
pub mod secrets;
pub mod ui;
