//! cli::commands::completion
//!
//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::args::Cli;

/// Write completions for `shell` to stdout.
pub fn completion(shell: Shell) {
    let mut command = Cli::command();
    generate(shell, &mut command, "scriv", &mut std::io::stdout());
}
