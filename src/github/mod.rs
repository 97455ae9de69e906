//! github
//!
//! Object store abstraction over GitHub's Git Data API.
//!
//! # Components
//!
//! - [`traits`] - The `ObjectStore` trait, wire types, and the closed
//!   `StoreError` taxonomy
//! - [`rest`] - REST implementation over reqwest
//!   (the only module that sees HTTP status codes)
//! - [`mock`] - Deterministic in-memory implementation for tests
//! - [`factory`] - Store creation behind a factory boundary

pub mod factory;
pub mod mock;
pub mod rest;
pub mod traits;

pub use factory::{GitHubStoreFactory, StoreFactory};
pub use rest::{parse_file_url, FileLocation, GitHubStore, PollSettings};
pub use traits::{
    BlobContent, CommitInfo, Comparison, ContributorStats, FileSnapshot, ObjectStore, RepoInfo,
    StoreError,
};
