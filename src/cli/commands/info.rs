//! cli::commands::info
//!
//! Repository overview: metadata, branches, contributor statistics.
//!
//! Contributor statistics are computed asynchronously server-side; the
//! store retries 202 responses on a fixed interval with a hard cap, so
//! this command reports "still computing" instead of hanging.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};

use crate::auth::CredentialStore;
use crate::cli::Context;
use crate::config::Config;
use crate::github::{parse_file_url, GitHubStoreFactory, StoreError, StoreFactory};
use crate::secrets;

/// Run the info command.
pub async fn info(ctx: &Context, target: &str) -> Result<()> {
    let console = ctx.console();

    let (owner, repo) = parse_repo_target(target)
        .context("expected 'owner/repo' or a GitHub repository URL")?;

    let config = Config::load()?;
    let secret_store = secrets::create_store().context("failed to initialize secret store")?;
    let credentials = Arc::new(CredentialStore::new(secret_store));
    if !credentials.is_configured() {
        bail!("no credentials stored. Run 'scriv auth login' first.");
    }

    let factory = GitHubStoreFactory::new(credentials, &config.api_base, config.poll_settings());
    let store = factory.open(&owner, &repo);

    let repo_info = store.show().await.context("failed to load repository")?;
    println!("{}/{}", repo_info.owner, repo_info.name);
    println!("  default branch: {}", repo_info.default_branch);
    println!("  url:            {}", repo_info.html_url);

    let branches = store.branches().await.context("failed to list branches")?;
    println!("  branches ({}):", branches.len());
    for branch in &branches {
        println!("    {}", branch);
    }

    match store.contributor_stats().await {
        Ok(stats) => {
            let mut stats = stats;
            stats.sort_by(|a, b| b.total.cmp(&a.total));
            println!("  contributors:");
            for contributor in stats.iter().take(10) {
                println!("    {:>6}  {}", contributor.total, contributor.login);
            }
        }
        Err(StoreError::Pending) => {
            console.warn("contributor statistics are still being computed; try again later");
        }
        Err(e) => return Err(e).context("failed to load contributor statistics"),
    }

    Ok(())
}

/// Accept `owner/repo` or any GitHub URL that names a repository.
fn parse_repo_target(target: &str) -> Option<(String, String)> {
    if let Some(location) = parse_file_url(target) {
        return Some((location.owner, location.repo));
    }

    let rest = target
        .strip_prefix("https://github.com/")
        .or_else(|| target.strip_prefix("http://github.com/"))
        .unwrap_or(target);
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let parts: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    match parts.as_slice() {
        [owner, repo, ..] if !target.contains("://") || target.contains("github.com") => {
            Some((owner.to_string(), repo.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_owner_repo() {
        assert_eq!(
            parse_repo_target("octocat/notes"),
            Some(("octocat".into(), "notes".into()))
        );
    }

    #[test]
    fn repo_url() {
        assert_eq!(
            parse_repo_target("https://github.com/octocat/notes"),
            Some(("octocat".into(), "notes".into()))
        );
        assert_eq!(
            parse_repo_target("https://github.com/octocat/notes.git"),
            Some(("octocat".into(), "notes".into()))
        );
    }

    #[test]
    fn blob_url_names_its_repo() {
        assert_eq!(
            parse_repo_target("https://github.com/octocat/notes/blob/main/f.md"),
            Some(("octocat".into(), "notes".into()))
        );
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(parse_repo_target("justonepart"), None);
        assert_eq!(parse_repo_target("https://gitlab.com/o/r"), None);
    }
}
