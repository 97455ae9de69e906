//! cli::commands
//!
//! Command handlers.

pub mod auth;
pub mod completion;
pub mod edit;
pub mod info;

use anyhow::Result;

use super::args::Command;
use super::Context;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Edit {
            url,
            message,
            branch,
            from,
        } => edit::edit(ctx, &url, message.as_deref(), branch.as_deref(), from.as_deref()).await,
        Command::Info { target } => info::info(ctx, &target).await,
        Command::Auth { command } => auth::dispatch(ctx, command),
        Command::Completion { shell } => {
            completion::completion(shell);
            Ok(())
        }
    }
}
