//! Backend gateway port for reading and writing files.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::options::{Encoding, WriteFlag};

/// Boxed future type alias used by [`FileBackend`] to keep the trait dyn-compatible.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Successful backend response for a read or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResponse {
    /// File contents as they cross the wire. Raw reads arrive base64-encoded.
    pub contents: String,
    /// The resolved path the backend operated on.
    pub file_path: String,
}

/// A normalized write, ready for the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Path as the caller gave it.
    pub path: String,
    /// Wire contents; always text.
    pub contents: String,
    /// How the backend turns `contents` into bytes.
    pub encoding: Encoding,
    /// File-system flag.
    pub flag: WriteFlag,
}

/// Machine-readable failure category reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// The file does not exist (`ENOENT`).
    NotFound,
    /// The transport gave up waiting (`ETIMEDOUT`).
    TimedOut,
    /// Any other backend code, e.g. `EACCES`.
    Other(String),
}

impl ErrorCode {
    /// Returns the node-style code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotFound => "ENOENT",
            Self::TimedOut => "ETIMEDOUT",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "ENOENT" => Self::NotFound,
            "ETIMEDOUT" => Self::TimedOut,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from(code.as_str()))
    }
}

/// A failure reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct BackendError {
    /// Failure category.
    pub code: ErrorCode,
    /// Resolved path, when the backend got far enough to know it.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl BackendError {
    /// Creates a backend error.
    pub fn new(code: ErrorCode, file_path: Option<String>, message: impl Into<String>) -> Self {
        Self { code, file_path, message: message.into() }
    }

    /// Creates a `NotFound` error for the given resolved path.
    pub fn not_found(file_path: impl Into<String>) -> Self {
        let file_path = file_path.into();
        let message = format!("ENOENT: no such file or directory, open '{file_path}'");
        Self::new(ErrorCode::NotFound, Some(file_path), message)
    }
}

/// Performs file reads and writes on behalf of the commands.
///
/// Abstracting the backend allows the commands to run against the local
/// disk, an in-memory store, or a recorded cassette.
pub trait FileBackend: Send + Sync {
    /// Reads a file. With [`Encoding::Raw`] the contents come back base64-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::NotFound`] when the file does not exist, or any
    /// other code when the read fails.
    fn read_file<'a>(&'a self, path: &'a str, encoding: &'a Encoding)
        -> BackendFuture<'a, FileResponse>;

    /// Writes a file according to the request's encoding and flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails, including [`ErrorCode::TimedOut`]
    /// when the transport gives up.
    fn write_file<'a>(&'a self, request: &'a WriteRequest) -> BackendFuture<'a, FileResponse>;
}

impl<T: FileBackend + ?Sized> FileBackend for std::sync::Arc<T> {
    fn read_file<'a>(
        &'a self,
        path: &'a str,
        encoding: &'a Encoding,
    ) -> BackendFuture<'a, FileResponse> {
        (**self).read_file(path, encoding)
    }

    fn write_file<'a>(&'a self, request: &'a WriteRequest) -> BackendFuture<'a, FileResponse> {
        (**self).write_file(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_code_round_trips_node_codes() {
        assert_eq!(ErrorCode::from("ENOENT"), ErrorCode::NotFound);
        assert_eq!(ErrorCode::from("ETIMEDOUT"), ErrorCode::TimedOut);
        assert_eq!(ErrorCode::from("EACCES"), ErrorCode::Other("EACCES".into()));
        assert_eq!(ErrorCode::Other("EISDIR".into()).to_string(), "EISDIR");
    }

    #[test]
    fn backend_error_deserializes_without_file_path() {
        let err: BackendError =
            serde_json::from_value(json!({"code": "EACCES", "message": "denied"})).unwrap();
        assert_eq!(err.code, ErrorCode::Other("EACCES".into()));
        assert!(err.file_path.is_none());
        assert_eq!(err.to_string(), "EACCES: denied");
    }

    #[test]
    fn not_found_carries_path() {
        let err = BackendError::not_found("/root/a.txt");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.file_path.as_deref(), Some("/root/a.txt"));
    }
}
