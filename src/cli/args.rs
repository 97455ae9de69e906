//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug output
//! - `--quiet` / `-q`: Minimal output; implies --no-interactive
//! - `--no-interactive`: Disable prompts

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

/// Scrivener - commit edited documents into GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "scriv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    ///
    /// Interactive unless `--no-interactive` or `--quiet` was given, and
    /// stdin is a TTY.
    pub fn interactive(&self) -> bool {
        if self.no_interactive || self.quiet {
            false
        } else {
            std::io::stdin().is_terminal()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a document from GitHub, edit it, and commit it back
    #[command(
        name = "edit",
        long_about = "Open a document from GitHub, edit it, and commit it back.\n\n\
            The file is fetched through the GitHub API, handed to $EDITOR (or read \
            from --from), and committed back through the Git Data API. Before any \
            branch pointer moves, the commit is checked for fast-forward safety; \
            if someone else committed in the meantime you choose between a fresh \
            branch, overwriting, or cancelling.",
        after_help = "\
EXAMPLES:
    # Edit a file in $EDITOR and commit the result
    scriv edit https://github.com/octocat/notes/blob/main/docs/intro.md

    # Commit pre-edited content on a new branch, non-interactively
    scriv edit https://github.com/octocat/notes/blob/main/docs/intro.md \\
        --from intro.md --branch review-pass --message \"Tighten intro\" --no-interactive"
    )]
    Edit {
        /// GitHub URL of the file (https://github.com/{owner}/{repo}/blob/{branch}/{path})
        url: String,

        /// Commit message (prompted for when omitted)
        #[arg(short, long)]
        message: Option<String>,

        /// Branch to commit on (defaults to the document's branch; created
        /// from it when missing)
        #[arg(short, long)]
        branch: Option<String>,

        /// Read the edited content from this file instead of launching $EDITOR
        #[arg(long, value_name = "PATH")]
        from: Option<PathBuf>,
    },

    /// Show repository metadata, branches, and contributor statistics
    Info {
        /// Repository as `owner/repo`, or any GitHub URL of the repository
        target: String,
    },

    /// Manage stored GitHub credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Credential management subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Store a token or username/password
    Login {
        /// Personal access token (prompted for securely when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Authenticate with username/password instead of a token
        #[arg(long, conflicts_with = "token")]
        username: Option<String>,
    },

    /// Show whether credentials are stored
    Status,

    /// Remove stored credentials
    Logout,
}
