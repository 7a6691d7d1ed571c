//! Interactive prompt transport.
//!
//! Parameter resolution only needs "ask for `name`, get a string back". The
//! transport behind that is swappable: a terminal prompt for normal runs, a
//! refusing implementation for unattended runs, scripted ones in tests.

use std::io::IsTerminal;
use thiserror::Error;

/// Why a prompt produced no answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// No interactive channel exists (stdin is not a terminal, or prompting is disabled)
    #[error("no interactive terminal available")]
    Unavailable,

    /// Input ended before an answer was given
    #[error("input closed before an answer was given")]
    EndOfInput,

    /// Any other transport failure
    #[error("prompt failed: {0}")]
    Transport(String),
}

/// A channel able to ask the user for a parameter value.
///
/// Implementations block until an answer is available. An empty string is a
/// valid return value; callers decide whether empty is acceptable.
pub trait Prompter {
    fn ask(
        &mut self,
        name: &str,
        description: &str,
        default: Option<&str>,
    ) -> Result<String, PromptError>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(
        &mut self,
        name: &str,
        description: &str,
        default: Option<&str>,
    ) -> Result<String, PromptError> {
        if !std::io::stdin().is_terminal() {
            return Err(PromptError::Unavailable);
        }

        let mut input = dialoguer::Input::<String>::new()
            .with_prompt(format!("{} ({})", name, description))
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }

        input.interact_text().map_err(|err| match err {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                PromptError::EndOfInput
            }
            dialoguer::Error::IO(e) => PromptError::Transport(e.to_string()),
        })
    }
}

/// Refuses every prompt; used for unattended runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn ask(&mut self, name: &str, _: &str, _: Option<&str>) -> Result<String, PromptError> {
        tracing::debug!("Refusing prompt for '{}' in non-interactive mode", name);
        Err(PromptError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_interactive_always_refuses() {
        let mut prompter = NonInteractive;
        assert_eq!(
            prompter.ask("port", "Port to expose", Some("80")),
            Err(PromptError::Unavailable)
        );
    }
}
