//! Replaying adapter for the `FileBackend` port.

use std::sync::Mutex;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::options::Encoding;
use crate::ports::backend::{
    BackendError, BackendFuture, ErrorCode, FileBackend, FileResponse, WriteRequest,
};

/// Backend code for a call the cassette cannot answer.
pub const CASSETTE_ERROR: &str = "ECASSETTE";

/// Replays recorded backend responses from a cassette.
///
/// Without a cassette every call fails with [`CASSETTE_ERROR`].
pub struct ReplayingBackend {
    replayer: Option<Mutex<CassetteReplayer>>,
}

impl ReplayingBackend {
    /// Creates a new replaying backend from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Some(Mutex::new(replayer)) }
    }

    /// A backend with nothing recorded.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }

    fn replay(&self, method: &str, path: &str) -> Result<FileResponse, BackendError> {
        let cassette_error =
            |message: String| BackendError::new(cassette_code(), Some(path.to_string()), message);

        let Some(replayer) = &self.replayer else {
            return Err(cassette_error(format!("no backend cassette configured for {method}")));
        };
        let output = next_output(replayer, "backend", method)
            .map_err(|e| cassette_error(e.to_string()))?;
        replay_result(output).map_err(cassette_error)?
    }
}

fn cassette_code() -> ErrorCode {
    ErrorCode::Other(CASSETTE_ERROR.to_string())
}

impl FileBackend for ReplayingBackend {
    fn read_file<'a>(
        &'a self,
        path: &'a str,
        _encoding: &'a Encoding,
    ) -> BackendFuture<'a, FileResponse> {
        Box::pin(async move { self.replay("read_file", path) })
    }

    fn write_file<'a>(&'a self, request: &'a WriteRequest) -> BackendFuture<'a, FileResponse> {
        Box::pin(async move { self.replay("write_file", &request.path) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn make_replayer(interactions: Vec<Interaction>) -> CassetteReplayer {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            project_root: "/project".into(),
            interactions,
        };
        CassetteReplayer::new(&cassette)
    }

    fn read(seq: u64, output: serde_json::Value) -> Interaction {
        Interaction {
            seq,
            port: "backend".into(),
            method: "read_file".into(),
            input: json!({"path": "a.txt", "encoding": "utf8"}),
            output,
        }
    }

    #[tokio::test]
    async fn replays_recorded_errors_then_success() {
        let backend = ReplayingBackend::new(make_replayer(vec![
            read(
                0,
                json!({"Err": {
                    "code": "ENOENT",
                    "file_path": "/project/a.txt",
                    "message": "ENOENT: no such file or directory"
                }}),
            ),
            read(1, json!({"Ok": {"contents": "hi", "file_path": "/project/a.txt"}})),
        ]));

        let encoding = Encoding::utf8();
        let err = backend.read_file("a.txt", &encoding).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.file_path.as_deref(), Some("/project/a.txt"));

        let response = backend.read_file("a.txt", &encoding).await.unwrap();
        assert_eq!(response.contents, "hi");
    }

    #[tokio::test]
    async fn exhausted_cassette_is_a_backend_error() {
        let backend = ReplayingBackend::new(make_replayer(vec![]));
        let err = backend.read_file("a.txt", &Encoding::Raw).await.unwrap_err();
        assert_eq!(err.code.as_str(), CASSETTE_ERROR);
        assert!(err.message.contains("Cassette exhausted"));
    }

    #[tokio::test]
    async fn malformed_output_is_a_backend_error() {
        let backend = ReplayingBackend::new(make_replayer(vec![read(0, json!("oops"))]));
        let err = backend.read_file("a.txt", &Encoding::utf8()).await.unwrap_err();
        assert!(err.message.contains("malformed recorded result"));
    }

    #[tokio::test]
    async fn unconfigured_backend_refuses_writes() {
        let backend = ReplayingBackend::unconfigured();
        let request = WriteRequest {
            path: "a.txt".into(),
            contents: "x".into(),
            encoding: Encoding::utf8(),
            flag: crate::options::WriteFlag::Write,
        };
        let err = backend.write_file(&request).await.unwrap_err();
        assert_eq!(err.code.as_str(), CASSETTE_ERROR);
        assert_eq!(err.file_path.as_deref(), Some("a.txt"));
    }
}
