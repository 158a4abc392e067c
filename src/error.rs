//! Error types surfaced by the file commands.

use std::fmt;

use crate::assertion::AssertionError;

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, CommandError>;

/// The user-facing command that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    /// `readFile`
    ReadFile,
    /// `writeFile`
    WriteFile,
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile => f.write_str("readFile"),
            Self::WriteFile => f.write_str("writeFile"),
        }
    }
}

/// The backend action a command was attempting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Reading a file.
    Read,
    /// Writing a file.
    Write,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Errors that can occur while running a file command.
///
/// An absent file is not represented here: reads fold "not found" into
/// [`crate::content::ReadContents::Absent`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("`{cmd}()` must be passed a non-empty string as its 1st argument. You passed: `{file}`.")]
    InvalidArgument { cmd: CommandName, file: String },

    #[error(
        "`writeFile()` must be passed a non-empty string, an object, or an array as its 2nd argument. You passed: `{contents}`."
    )]
    InvalidContents { contents: String },

    #[error(
        "`{cmd}(\"{file}\")` failed while trying to {action} the file at the following path:\n\n  `{}`\n\nThe following error occurred:\n\n  > \"{message}\"",
        resolved_path(.file, .file_path)
    )]
    UnexpectedBackend {
        cmd: CommandName,
        action: Action,
        file: String,
        file_path: Option<String>,
        message: String,
    },

    #[error("`{cmd}(\"{file}\")` timed out after waiting `{timeout_ms}ms`.")]
    TimedOut { cmd: CommandName, file: String, timeout_ms: u128 },

    #[error(transparent)]
    Assertion(#[from] AssertionError),
}

impl CommandError {
    /// Builds an [`CommandError::InvalidArgument`] for the given command.
    pub fn invalid_argument(cmd: CommandName, file: impl Into<String>) -> Self {
        Self::InvalidArgument { cmd, file: file.into() }
    }

    /// Returns the command name attached to this error, if any.
    #[must_use]
    pub fn command(&self) -> Option<CommandName> {
        match self {
            Self::InvalidArgument { cmd, .. }
            | Self::UnexpectedBackend { cmd, .. }
            | Self::TimedOut { cmd, .. } => Some(*cmd),
            Self::InvalidContents { .. } => Some(CommandName::WriteFile),
            Self::Assertion(_) => Some(CommandName::ReadFile),
        }
    }
}

fn resolved_path<'a>(file: &'a str, file_path: &'a Option<String>) -> &'a str {
    file_path.as_deref().unwrap_or(file)
}
