//! Recording adapter for the `FileBackend` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::options::Encoding;
use crate::ports::backend::{BackendFuture, FileBackend, FileResponse, WriteRequest};

/// Records backend interactions while delegating to an inner implementation.
pub struct RecordingBackend {
    inner: Box<dyn FileBackend>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingBackend {
    /// Creates a new recording backend wrapping the given implementation.
    pub fn new(inner: Box<dyn FileBackend>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct ReadInput<'a> {
    path: &'a str,
    encoding: &'a Encoding,
}

impl FileBackend for RecordingBackend {
    fn read_file<'a>(
        &'a self,
        path: &'a str,
        encoding: &'a Encoding,
    ) -> BackendFuture<'a, FileResponse> {
        Box::pin(async move {
            let result = self.inner.read_file(path, encoding).await;
            let input = ReadInput { path, encoding };
            record_result(&self.recorder, "backend", "read_file", &input, &result);
            result
        })
    }

    fn write_file<'a>(&'a self, request: &'a WriteRequest) -> BackendFuture<'a, FileResponse> {
        Box::pin(async move {
            let result = self.inner.write_file(request).await;
            record_result(&self.recorder, "backend", "write_file", request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use crate::cassette::format::Cassette;
    use crate::options::WriteFlag;
    use serde_json::json;

    #[tokio::test]
    async fn records_reads_and_writes_with_ok_err_convention() {
        let dir = std::env::temp_dir().join("fileassert_rec_backend_test");
        std::fs::create_dir_all(&dir).unwrap();
        let cassette_path = dir.join("backend.cassette.yaml");

        let recorder =
            Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "test", "/project")));

        {
            let backend =
                RecordingBackend::new(Box::new(InMemoryBackend::new()), Arc::clone(&recorder));
            let _ = backend.read_file("missing.txt", &Encoding::utf8()).await;
            let request = WriteRequest {
                path: "a.txt".into(),
                contents: "hi".into(),
                encoding: Encoding::utf8(),
                flag: WriteFlag::Write,
            };
            backend.write_file(&request).await.unwrap();
        }

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();

        let cassette = Cassette::load(&cassette_path).unwrap();
        assert_eq!(cassette.interactions.len(), 2);

        let read = &cassette.interactions[0];
        assert_eq!(read.method, "read_file");
        assert_eq!(read.input, json!({"path": "missing.txt", "encoding": "utf8"}));
        assert_eq!(read.output["Err"]["code"], json!("ENOENT"));

        let write = &cassette.interactions[1];
        assert_eq!(write.method, "write_file");
        assert_eq!(write.input["flag"], json!("w"));
        assert_eq!(write.output["Ok"]["file_path"], json!("/project/a.txt"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
