//! ui
//!
//! Console output and prompts.
//!
//! # Design
//!
//! Output goes through [`output`] so verbosity is applied consistently;
//! interactive questions go through [`prompts`], which fail cleanly in
//! non-interactive mode instead of hanging on stdin.

pub mod output;
pub mod prompts;

pub use output::{Console, Verbosity};
pub use prompts::PromptError;
