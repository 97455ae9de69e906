//! ui::output
//!
//! Console output with a verbosity policy.
//!
//! # Design
//!
//! Everything the tool prints goes through a [`Console`], so quiet and
//! debug modes are applied in one place. Dialogs coming from the
//! editor-host surface render as a titled block.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Minimal output
    Quiet,
    /// Standard output
    Normal,
    /// Verbose output
    Debug,
}

impl Verbosity {
    /// Derive the verbosity from the global CLI flags. Quiet wins over
    /// debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        }
    }
}

/// Console writer applying the verbosity policy.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    verbosity: Verbosity,
}

impl Console {
    /// Create a console at the given verbosity.
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// The configured verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Print a line of standard output. Suppressed in quiet mode.
    pub fn print(&self, message: impl Display) {
        if self.verbosity != Verbosity::Quiet {
            println!("{}", message);
        }
    }

    /// Print a debug line to stderr. Shown only in debug mode.
    pub fn debug(&self, message: impl Display) {
        if self.verbosity == Verbosity::Debug {
            eprintln!("[debug] {}", message);
        }
    }

    /// Print a warning to stderr. Suppressed in quiet mode.
    pub fn warn(&self, message: impl Display) {
        if self.verbosity != Verbosity::Quiet {
            eprintln!("warning: {}", message);
        }
    }

    /// Render a host dialog as a titled block. Suppressed in quiet mode.
    pub fn dialog(&self, title: &str, body: &str) {
        if self.verbosity != Verbosity::Quiet {
            println!();
            println!("== {} ==", title);
            println!("{}", body);
        }
    }
}

/// Print an error to stderr. Always shown, whatever the verbosity.
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}
