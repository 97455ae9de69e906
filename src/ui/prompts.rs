//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! operations requiring user input must either have defaults or fail
//! with a clear error message.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Prompt for confirmation (yes/no).
///
/// An empty answer picks `default`. Returns
/// `Err(PromptError::NotInteractive)` if not in interactive mode.
pub fn confirm(message: &str, default: bool, interactive: bool) -> Result<bool, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let answer = read_answer(&format!("{} {} ", message, hint))?;
    Ok(match answer.to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    })
}

/// Prompt for text input. An empty answer picks `default` when given.
pub fn input(
    message: &str,
    default: Option<&str>,
    interactive: bool,
) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    let prompt = match default {
        Some(d) => format!("{} [{}]: ", message, d),
        None => format!("{}: ", message),
    };
    let answer = read_answer(&prompt)?;
    if answer.is_empty() {
        match default {
            Some(d) => Ok(d.to_string()),
            None => Ok(String::new()),
        }
    } else {
        Ok(answer)
    }
}

/// Prompt to select from a list of options. Returns the index of the
/// selected option; an empty answer picks `default` when given.
pub fn select<T: AsRef<str>>(
    message: &str,
    options: &[T],
    default: Option<usize>,
    interactive: bool,
) -> Result<usize, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    eprintln!("{}", message);
    for (i, option) in options.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, option.as_ref());
    }

    let hint = match default {
        Some(d) => format!("Choice [{}]: ", d + 1),
        None => "Choice: ".to_string(),
    };
    let answer = read_answer(&hint)?;
    if answer.is_empty() {
        return default.ok_or(PromptError::Cancelled);
    }
    match answer.parse::<usize>() {
        Ok(n) if n >= 1 && n <= options.len() => Ok(n - 1),
        _ => default.ok_or(PromptError::Cancelled),
    }
}

/// Prompt for masked input (passwords, tokens). The input is not echoed.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    rpassword::prompt_password(format!("{}: ", message))
        .map_err(|e| PromptError::IoError(e.to_string()))
}

/// Write the prompt to stderr and read one trimmed line from stdin.
fn read_answer(prompt: &str) -> Result<String, PromptError> {
    eprint!("{}", prompt);
    io::stderr()
        .flush()
        .map_err(|e| PromptError::IoError(e.to_string()))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| PromptError::IoError(e.to_string()))?;
    Ok(line.trim().to_string())
}
