//! cli::commands::edit
//!
//! The edit command: open a GitHub file, edit it, commit it back.
//!
//! # Flow
//!
//! 1. Fetch the file through the API; its blob sha seeds the session
//! 2. Hand the content to $EDITOR (or read `--from`)
//! 3. Drive the commit pipeline; let the resolver handle divergences,
//!    access denials, and credential failures
//! 4. On success, report where the commit landed - possibly a different
//!    branch or owner than the document was opened from

use std::env;
use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use uuid::Uuid;

use crate::auth::{CredentialProvider, CredentialStore};
use crate::cli::Context;
use crate::commit::{CommitPipeline, CommitRequest, ConflictResolver, Resolution};
use crate::config::Config;
use crate::github::{parse_file_url, GitHubStoreFactory, StoreError, StoreFactory};
use crate::host::{ConsoleDocumentHost, ConsoleWorkspace, DocumentHost};
use crate::secrets;
use crate::ui::output::Console;
use crate::ui::prompts;

/// Run the edit command.
pub async fn edit(
    ctx: &Context,
    url: &str,
    message: Option<&str>,
    branch: Option<&str>,
    from: Option<&Path>,
) -> Result<()> {
    let console = ctx.console();

    let location = parse_file_url(url).context(
        "unrecognized GitHub file URL; expected \
         https://github.com/{owner}/{repo}/blob/{branch}/{path}",
    )?;

    let config = Config::load()?;
    let secret_store = secrets::create_store().context("failed to initialize secret store")?;
    let credentials = Arc::new(CredentialStore::new(secret_store));
    if !credentials.is_configured() {
        bail!("no credentials stored. Run 'scriv auth login' first.");
    }

    let factory = Arc::new(GitHubStoreFactory::new(
        credentials.clone(),
        &config.api_base,
        config.poll_settings(),
    ));
    let store = factory.open(&location.owner, &location.repo);

    // Load the document; its blob sha is the point the session syncs from.
    let snapshot = match store.file_snapshot(&location.branch, &location.path).await {
        Ok(snapshot) => snapshot,
        Err(StoreError::Unauthenticated) => {
            credentials.invalidate();
            bail!("not authorized; stored credentials were cleared. Run 'scriv auth login'.");
        }
        Err(StoreError::NotFound(_)) => {
            bail!(
                "could not find {}. The file may not exist, or you may not have read access.",
                location.html_url()
            );
        }
        Err(e) => return Err(e).context("failed to load the document"),
    };

    let opened_session = crate::commit::CommitSession::opened(
        &location.owner,
        &location.repo,
        &location.branch,
        &location.path,
        &snapshot.blob_sha,
    );
    console.debug(format!(
        "opened {} at blob {}",
        location.path, snapshot.blob_sha
    ));

    // Obtain the edited content.
    let edited = match from {
        Some(path) => fs::read(path)
            .with_context(|| format!("failed to read edited content from {}", path.display()))?,
        None => {
            if !ctx.interactive {
                bail!("--from is required in non-interactive mode");
            }
            edit_in_editor(&location.path, &snapshot.content)?
        }
    };

    if edited == snapshot.content {
        console.print("No changes to commit.");
        return Ok(());
    }

    let message = match message {
        Some(message) => message.to_string(),
        None => prompts::input("Commit message", None, ctx.interactive)
            .context("a commit message is required; pass --message")?,
    };
    if message.trim().is_empty() {
        bail!("empty commit message");
    }

    let target_branch = branch.unwrap_or(&location.branch).to_string();

    let host = Arc::new(ConsoleDocumentHost::new(edited.clone(), console));
    let workspace = Arc::new(ConsoleWorkspace::new(
        console,
        ctx.interactive,
        config.offer_browser,
    ));
    let pipeline = CommitPipeline::new(store.clone(), host.clone());
    let resolver = ConflictResolver::new(
        factory.clone(),
        workspace,
        host.clone(),
        credentials.clone(),
        &config.branch_prefix,
    );

    let (session, outcome) = pipeline
        .commit(
            &opened_session,
            CommitRequest {
                branch: target_branch,
                message,
            },
        )
        .await;
    let (final_session, resolution) = resolver.resolve(store.as_ref(), &session, outcome).await;

    match resolution {
        Resolution::Committed(receipt) => {
            host.set_dirty(false);
            console.debug(format!("committed {}", receipt.commit_sha));
            if final_session.moved_from(&opened_session) {
                console.print(format!(
                    "The document now lives at {}",
                    final_session.document_url()
                ));
            }
            Ok(())
        }
        Resolution::Cancelled => {
            preserve_draft(&location.path, &edited, from, console);
            console.print("Commit cancelled; your changes were not committed.");
            Ok(())
        }
        Resolution::Reauthenticate => bail!("authentication required; run 'scriv auth login'"),
        Resolution::Failed => {
            preserve_draft(&location.path, &edited, from, console);
            bail!("commit failed");
        }
    }
}

/// Hand the content to $VISUAL / $EDITOR via a temp file and read the
/// result back.
fn edit_in_editor(file_path: &str, content: &[u8]) -> Result<Vec<u8>> {
    let editor = env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string());

    let file_name = file_path.rsplit('/').next().unwrap_or("document");
    let temp_path = env::temp_dir().join(format!(
        "scriv-{}-{}",
        Uuid::new_v4().simple(),
        file_name
    ));
    fs::write(&temp_path, content).context("failed to stage the document for editing")?;

    // $EDITOR may carry arguments ("code --wait").
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    let status = process::Command::new(program)
        .args(parts)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("failed to launch editor '{}'", editor))?;
    if !status.success() {
        let _ = fs::remove_file(&temp_path);
        bail!("editor exited with {}", status);
    }

    let edited = fs::read(&temp_path).context("failed to read the edited document")?;
    let _ = fs::remove_file(&temp_path);
    Ok(edited)
}

/// Keep uncommitted edits on disk when the editor flow produced them;
/// with `--from` the source file already holds them.
fn preserve_draft(file_path: &str, edited: &[u8], from: Option<&Path>, console: Console) {
    if from.is_some() {
        return;
    }
    let file_name = file_path.rsplit('/').next().unwrap_or("document");
    let draft = format!("{}.draft", file_name);
    match fs::write(&draft, edited) {
        Ok(()) => console.print(format!("Your edits were saved to {}", draft)),
        Err(e) => console.warn(format!("could not save draft {}: {}", draft, e)),
    }
}
