//! cli
//!
//! Command-line interface layer for Scrivener.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT talk to the GitHub API directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers in [`commands`]; all repository writes flow through the
//! [`crate::commit`] pipeline.

pub mod args;
pub mod commands;

pub use args::{AuthCommand, Cli, Command, Shell};

use anyhow::Result;

use crate::ui::output::{Console, Verbosity};

/// Flags shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Debug output enabled.
    pub debug: bool,
    /// Minimal output.
    pub quiet: bool,
    /// Whether prompts may be shown.
    pub interactive: bool,
}

impl Context {
    /// Console honoring the output flags.
    pub fn console(&self) -> Console {
        Console::new(Verbosity::from_flags(self.quiet, self.debug))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(),
    };

    commands::dispatch(cli.command, &ctx).await
}
