//! cli::commands::auth
//!
//! Credential management commands.
//!
//! # Design
//!
//! - Credentials are stored through the secret store, never printed
//! - Tokens can be passed via `--token` for scripting, but the interactive
//!   path reads them with a masked prompt
//! - `logout` clears the stored record; the next `edit` will refuse to run
//!   until `login` is repeated

use anyhow::{bail, Context as _, Result};

use crate::auth::{CredentialStore, Credentials};
use crate::cli::args::AuthCommand;
use crate::cli::Context;
use crate::secrets;
use crate::ui::prompts;

/// Dispatch an auth subcommand.
pub fn dispatch(ctx: &Context, command: AuthCommand) -> Result<()> {
    let store = secrets::create_store().context("failed to initialize secret store")?;
    let credentials = CredentialStore::new(store);

    match command {
        AuthCommand::Login { token, username } => {
            login(ctx, &credentials, token.as_deref(), username.as_deref())
        }
        AuthCommand::Status => status(ctx, &credentials),
        AuthCommand::Logout => logout(ctx, &credentials),
    }
}

/// Store credentials. Never prints the values.
fn login(
    ctx: &Context,
    credentials: &CredentialStore,
    token: Option<&str>,
    username: Option<&str>,
) -> Result<()> {
    let record = if let Some(token) = token {
        validate_token(token)?;
        Credentials::Token {
            token: token.to_string(),
        }
    } else if let Some(username) = username {
        let password = prompts::password("Password", ctx.interactive)
            .context("a password is required for basic authentication")?;
        if password.is_empty() {
            bail!("empty password");
        }
        Credentials::Basic {
            username: username.to_string(),
            password,
        }
    } else {
        let token = prompts::password("GitHub access token", ctx.interactive)
            .context("pass --token, or run interactively to be prompted")?;
        validate_token(&token)?;
        Credentials::Token { token }
    };

    credentials.save(&record)?;
    if !ctx.quiet {
        println!("Authentication configured ({}).", record.kind());
    }
    Ok(())
}

/// Show whether credentials are stored. Never prints the values.
fn status(ctx: &Context, credentials: &CredentialStore) -> Result<()> {
    match credentials.load()? {
        Some(record) => {
            if ctx.quiet {
                println!("configured");
            } else {
                println!("Credentials stored ({}).", record.kind());
            }
        }
        None => {
            if ctx.quiet {
                println!("none");
            } else {
                println!("No credentials stored. Run 'scriv auth login'.");
            }
        }
    }
    Ok(())
}

/// Remove stored credentials.
fn logout(ctx: &Context, credentials: &CredentialStore) -> Result<()> {
    credentials.clear()?;
    if !ctx.quiet {
        println!("Logged out; stored credentials removed.");
    }
    Ok(())
}

/// Basic shape checks so obviously broken values are rejected early.
fn validate_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        bail!("empty token");
    }
    if token.contains(char::is_whitespace) {
        bail!("token contains whitespace; was it pasted correctly?");
    }
    Ok(())
}
