//! Live file backend over `tokio::fs`.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::adapters::encoding::{bytes_to_wire, wire_to_bytes, EncodingError};
use crate::options::Encoding;
use crate::ports::backend::{
    BackendError, BackendFuture, ErrorCode, FileBackend, FileResponse, WriteRequest,
};

/// Live backend that reads and writes the host file system.
///
/// Relative paths resolve against the project root; the absolute path is
/// reported back as `file_path`.
pub struct LiveFileBackend {
    root: PathBuf,
}

impl LiveFileBackend {
    /// Creates a backend rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    async fn read(&self, path: &str, encoding: &Encoding) -> Result<FileResponse, BackendError> {
        let resolved = self.resolve(path);
        let file_path = resolved.display().to_string();
        tracing::debug!(%file_path, %encoding, "Reading file");

        let bytes = tokio::fs::read(&resolved).await.map_err(|e| io_error(&file_path, &e))?;
        let contents = bytes_to_wire(&bytes, encoding).map_err(|e| encoding_error(&file_path, e))?;
        Ok(FileResponse { contents, file_path })
    }

    async fn write(&self, request: &WriteRequest) -> Result<FileResponse, BackendError> {
        let resolved = self.resolve(&request.path);
        let file_path = resolved.display().to_string();
        tracing::debug!(
            %file_path,
            encoding = %request.encoding,
            flag = %request.flag,
            "Writing file"
        );

        let bytes = wire_to_bytes(&request.contents, &request.encoding)
            .map_err(|e| encoding_error(&file_path, e))?;

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| io_error(&file_path, &e))?;
        }

        let flag = request.flag;
        let mut file = tokio::fs::OpenOptions::new()
            .read(matches!(flag.as_str(), "w+" | "a+"))
            .write(!flag.appends())
            .append(flag.appends())
            .truncate(!flag.appends())
            .create(!flag.exclusive())
            .create_new(flag.exclusive())
            .open(&resolved)
            .await
            .map_err(|e| io_error(&file_path, &e))?;
        file.write_all(&bytes).await.map_err(|e| io_error(&file_path, &e))?;
        file.flush().await.map_err(|e| io_error(&file_path, &e))?;

        Ok(FileResponse { contents: request.contents.clone(), file_path })
    }
}

impl FileBackend for LiveFileBackend {
    fn read_file<'a>(
        &'a self,
        path: &'a str,
        encoding: &'a Encoding,
    ) -> BackendFuture<'a, FileResponse> {
        Box::pin(self.read(path, encoding))
    }

    fn write_file<'a>(&'a self, request: &'a WriteRequest) -> BackendFuture<'a, FileResponse> {
        Box::pin(self.write(request))
    }
}

fn io_error(file_path: &str, err: &io::Error) -> BackendError {
    let code = match err.kind() {
        io::ErrorKind::NotFound => ErrorCode::NotFound,
        io::ErrorKind::TimedOut => ErrorCode::TimedOut,
        io::ErrorKind::PermissionDenied => ErrorCode::Other("EACCES".into()),
        io::ErrorKind::AlreadyExists => ErrorCode::Other("EEXIST".into()),
        io::ErrorKind::IsADirectory => ErrorCode::Other("EISDIR".into()),
        _ => ErrorCode::Other("EIO".into()),
    };
    let message = format!("{code}: {err}, open '{file_path}'");
    BackendError::new(code, Some(file_path.to_string()), message)
}

fn encoding_error(file_path: &str, err: EncodingError) -> BackendError {
    BackendError::new(ErrorCode::from(err.code), Some(file_path.to_string()), err.message)
}
