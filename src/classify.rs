//! Classifies backend results into outcomes or command errors.

use crate::error::{Action, CommandError, CommandName};
use crate::ports::{BackendError, ErrorCode, FileResponse};

/// What a single read attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Wire contents, or `None` when the file does not exist.
    pub contents: Option<String>,
    /// Resolved path reported by the backend.
    pub file_path: Option<String>,
}

/// Classifies the result of a backend read.
///
/// `NotFound` is folded into an absent outcome; every other failure is an
/// unexpected backend error.
///
/// # Errors
///
/// Returns [`CommandError::UnexpectedBackend`] for any failure other than
/// `NotFound`.
pub fn classify_read(
    file: &str,
    result: Result<FileResponse, BackendError>,
) -> Result<ReadOutcome, CommandError> {
    match result {
        Ok(FileResponse { contents, file_path }) => {
            Ok(ReadOutcome { contents: Some(contents), file_path: Some(file_path) })
        }
        Err(BackendError { code: ErrorCode::NotFound, file_path, .. }) => {
            Ok(ReadOutcome { contents: None, file_path })
        }
        Err(err) => Err(unexpected(CommandName::ReadFile, Action::Read, file, err)),
    }
}

/// Classifies the result of a backend write.
///
/// # Errors
///
/// Returns [`CommandError::TimedOut`] when the backend reports a transport
/// timeout, or [`CommandError::UnexpectedBackend`] for anything else.
pub fn classify_write(
    file: &str,
    timeout_ms: u128,
    result: Result<FileResponse, BackendError>,
) -> Result<FileResponse, CommandError> {
    match result {
        Ok(response) => Ok(response),
        Err(BackendError { code: ErrorCode::TimedOut, .. }) => Err(CommandError::TimedOut {
            cmd: CommandName::WriteFile,
            file: file.to_string(),
            timeout_ms,
        }),
        Err(err) => Err(unexpected(CommandName::WriteFile, Action::Write, file, err)),
    }
}

/// Wraps a backend failure with command context.
pub fn unexpected(cmd: CommandName, action: Action, file: &str, err: BackendError) -> CommandError {
    CommandError::UnexpectedBackend {
        cmd,
        action,
        file: file.to_string(),
        file_path: err.file_path,
        message: err.message,
    }
}
