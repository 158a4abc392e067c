//! In-memory file backend with scripted behavior.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use crate::adapters::encoding::{bytes_to_wire, wire_to_bytes};
use crate::options::Encoding;
use crate::ports::backend::{
    BackendError, BackendFuture, ErrorCode, FileBackend, FileResponse, WriteRequest,
};

/// A backend call as observed by [`InMemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// A read of `path` with `encoding`.
    Read {
        /// Requested path.
        path: String,
        /// Requested encoding.
        encoding: Encoding,
    },
    /// A write request.
    Write(WriteRequest),
}

/// A file that materializes once it has been read a number of times.
struct PendingFile {
    after_reads: u32,
    bytes: Vec<u8>,
}

/// Backend storing files in memory.
///
/// Relative paths resolve under `/project`. Tests can make files appear
/// after a number of reads, inject failures, and slow down writes.
pub struct InMemoryBackend {
    root: String,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    pending: Mutex<HashMap<String, PendingFile>>,
    read_counts: Mutex<HashMap<String, u32>>,
    read_failures: Mutex<HashMap<String, BackendError>>,
    write_failure: Mutex<Option<BackendError>>,
    write_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl InMemoryBackend {
    /// Creates an empty backend rooted at `/project`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: "/project".to_string(),
            files: Mutex::new(BTreeMap::new()),
            pending: Mutex::new(HashMap::new()),
            read_counts: Mutex::new(HashMap::new()),
            read_failures: Mutex::new(HashMap::new()),
            write_failure: Mutex::new(None),
            write_delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Adds a file.
    #[must_use]
    pub fn with_file(self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Stores a file, replacing any previous contents.
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        let resolved = self.resolve(path);
        self.files.lock().expect("files lock poisoned").insert(resolved, bytes.into());
    }

    /// Removes a file.
    pub fn remove(&self, path: &str) {
        let resolved = self.resolve(path);
        self.files.lock().expect("files lock poisoned").remove(&resolved);
    }

    /// Makes `path` exist with `bytes` once it has been read `after_reads` times.
    #[must_use]
    pub fn appearing_after(self, path: &str, after_reads: u32, bytes: impl Into<Vec<u8>>) -> Self {
        let resolved = self.resolve(path);
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .insert(resolved, PendingFile { after_reads, bytes: bytes.into() });
        self
    }

    /// Makes every read of `path` fail with `error`.
    #[must_use]
    pub fn failing_reads(self, path: &str, code: &str, message: &str) -> Self {
        let resolved = self.resolve(path);
        let error = BackendError::new(ErrorCode::from(code), Some(resolved.clone()), message);
        self.read_failures.lock().expect("failures lock poisoned").insert(resolved, error);
        self
    }

    /// Makes every write fail with `error`.
    #[must_use]
    pub fn failing_writes(self, error: BackendError) -> Self {
        *self.write_failure.lock().expect("failures lock poisoned") = Some(error);
        self
    }

    /// Delays every write by `delay` before it takes effect.
    #[must_use]
    pub fn slow_writes(self, delay: Duration) -> Self {
        *self.write_delay.lock().expect("delay lock poisoned") = Some(delay);
        self
    }

    /// Returns the stored bytes of a file.
    #[must_use]
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let resolved = self.resolve(path);
        self.files.lock().expect("files lock poisoned").get(&resolved).cloned()
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// Number of reads received for `path`.
    #[must_use]
    pub fn reads_of(&self, path: &str) -> u32 {
        let resolved = self.resolve(path);
        self.read_counts.lock().expect("counts lock poisoned").get(&resolved).copied().unwrap_or(0)
    }

    /// Resolves a caller path to the path reported back as `file_path`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{}/{}", self.root, path.trim_start_matches("./"))
        }
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().expect("calls lock poisoned").push(call);
    }

    fn read_now(&self, path: &str, encoding: &Encoding) -> Result<FileResponse, BackendError> {
        let resolved = self.resolve(path);

        let reads = {
            let mut counts = self.read_counts.lock().expect("counts lock poisoned");
            let count = counts.entry(resolved.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(err) = self.read_failures.lock().expect("failures lock poisoned").get(&resolved)
        {
            return Err(err.clone());
        }

        {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            if pending.get(&resolved).is_some_and(|p| reads > p.after_reads) {
                if let Some(file) = pending.remove(&resolved) {
                    let mut files = self.files.lock().expect("files lock poisoned");
                    files.insert(resolved.clone(), file.bytes);
                }
            }
        }

        let files = self.files.lock().expect("files lock poisoned");
        let bytes = files.get(&resolved).ok_or_else(|| BackendError::not_found(&resolved))?;
        let contents = bytes_to_wire(bytes, encoding).map_err(|e| {
            BackendError::new(ErrorCode::from(e.code), Some(resolved.clone()), e.message)
        })?;
        Ok(FileResponse { contents, file_path: resolved })
    }

    fn write_now(&self, request: &WriteRequest) -> Result<FileResponse, BackendError> {
        let resolved = self.resolve(&request.path);

        if let Some(err) = self.write_failure.lock().expect("failures lock poisoned").clone() {
            return Err(err);
        }

        let bytes = wire_to_bytes(&request.contents, &request.encoding).map_err(|e| {
            BackendError::new(ErrorCode::from(e.code), Some(resolved.clone()), e.message)
        })?;

        let mut files = self.files.lock().expect("files lock poisoned");
        if request.flag.exclusive() && files.contains_key(&resolved) {
            return Err(BackendError::new(
                ErrorCode::Other("EEXIST".into()),
                Some(resolved.clone()),
                format!("EEXIST: file already exists, open '{resolved}'"),
            ));
        }
        let entry = files.entry(resolved.clone()).or_default();
        if !request.flag.appends() {
            entry.clear();
        }
        entry.extend_from_slice(&bytes);

        Ok(FileResponse { contents: request.contents.clone(), file_path: resolved })
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FileBackend for InMemoryBackend {
    fn read_file<'a>(
        &'a self,
        path: &'a str,
        encoding: &'a Encoding,
    ) -> BackendFuture<'a, FileResponse> {
        self.record(BackendCall::Read { path: path.to_string(), encoding: encoding.clone() });
        let result = self.read_now(path, encoding);
        Box::pin(async move { result })
    }

    fn write_file<'a>(&'a self, request: &'a WriteRequest) -> BackendFuture<'a, FileResponse> {
        self.record(BackendCall::Write(request.clone()));
        let delay = *self.write_delay.lock().expect("delay lock poisoned");
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.write_now(request)
        })
    }
}
