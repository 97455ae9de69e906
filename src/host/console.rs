//! host::console
//!
//! Console implementations of the host capability traits, used by the
//! CLI. Dialogs become prompts; the status indicator becomes a line of
//! output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::github::BlobContent;
use crate::ui::output::Console;
use crate::ui::prompts;

use super::{CommitStatus, DocumentHost, HostError, ResolutionChoice, Workspace};

/// Document host over content the CLI already has in memory (the edited
/// file).
pub struct ConsoleDocumentHost {
    content: Vec<u8>,
    dirty: AtomicBool,
    status: Mutex<CommitStatus>,
    console: Console,
}

impl ConsoleDocumentHost {
    /// Create a host for edited content. The document starts dirty; that
    /// is why a commit is being attempted.
    pub fn new(content: Vec<u8>, console: Console) -> Self {
        Self {
            content,
            dirty: AtomicBool::new(true),
            status: Mutex::new(CommitStatus::Idle),
            console,
        }
    }

    /// Whether the document still has uncommitted changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Last status set by the commit layer.
    pub fn status(&self) -> CommitStatus {
        *self.status.lock().unwrap()
    }
}

#[async_trait]
impl DocumentHost for ConsoleDocumentHost {
    async fn content(&self) -> Result<BlobContent, HostError> {
        match String::from_utf8(self.content.clone()) {
            Ok(text) => Ok(BlobContent::Text(text)),
            Err(e) => Ok(BlobContent::Binary(e.into_bytes())),
        }
    }

    fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::SeqCst);
    }

    fn set_status(&self, status: CommitStatus) {
        *self.status.lock().unwrap() = status;
        if status == CommitStatus::Loading {
            self.console.print("Committing...");
        }
    }
}

/// Console workspace: dialogs rendered as prompts.
pub struct ConsoleWorkspace {
    console: Console,
    interactive: bool,
    /// Offer to open comparison links in the browser.
    offer_browser: bool,
}

impl ConsoleWorkspace {
    /// Create a console workspace.
    pub fn new(console: Console, interactive: bool, offer_browser: bool) -> Self {
        Self {
            console,
            interactive,
            offer_browser,
        }
    }
}

#[async_trait]
impl Workspace for ConsoleWorkspace {
    async fn notify(&self, title: &str, body: &str) {
        self.console.dialog(title, body);
    }

    async fn confirm(&self, title: &str, body: &str) -> bool {
        self.console.dialog(title, body);
        prompts::confirm("Proceed?", false, self.interactive).unwrap_or(false)
    }

    async fn choose_resolution(&self, compare_url: &str) -> ResolutionChoice {
        self.console.dialog(
            "Commit status",
            &format!(
                "The commit may have conflicts. Review the changes here:\n  {}",
                compare_url
            ),
        );

        if self.offer_browser
            && prompts::confirm("Open the comparison in your browser?", false, self.interactive)
                .unwrap_or(false)
        {
            if let Err(e) = open::that(compare_url) {
                self.console.warn(format!("could not open browser: {}", e));
            }
        }

        let options = [
            "Commit on a fresh branch - keep your version on a new branch and merge it back once the conflicts are sorted out",
            "Commit anyway - overwrite the branch with your version",
            "Cancel - your changes will not be committed",
        ];

        match prompts::select("Pick one of the following:", &options, Some(2), self.interactive) {
            Ok(0) => ResolutionChoice::FreshBranch,
            Ok(1) => ResolutionChoice::Overwrite,
            _ => ResolutionChoice::Cancel,
        }
    }
}
