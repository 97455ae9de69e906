//! commit
//!
//! The commit orchestration layer.
//!
//! # Components
//!
//! - [`session`] - Per-document session state, threaded as an explicit
//!   value
//! - [`guard`] - Fast-forward guard run before any ref move
//! - [`pipeline`] - The attempt itself: join content + branch, guard,
//!   fast path or dangling commit
//! - [`resolver`] - Human-in-the-loop remediation of divergences and
//!   access denials
//! - [`context`] - The values the above exchange
//!
//! # Flow
//!
//! ```text
//! editor content ──┐
//!                  ├─ join ─ guard ─┬─ fast path ── move_ref ── session advances
//! branch ensured ──┘                └─ dangling commit ── resolver ── (retry/move/cancel)
//! ```

pub mod context;
pub mod guard;
pub mod pipeline;
pub mod resolver;
pub mod session;

pub use context::{
    CommitContext, CommitFailure, CommitOutcome, CommitReceipt, CommitRequest, DanglingCommit,
    Divergence,
};
pub use guard::Advice;
pub use pipeline::{BranchResolution, CommitPipeline};
pub use resolver::{fresh_branch_name, ConflictResolver, Resolution};
pub use session::CommitSession;
