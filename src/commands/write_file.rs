//! `writeFile`: normalize contents and write them in a single attempt.

use crate::classify::classify_write;
use crate::command_log::LogEntry;
use crate::content::{self, preview_text, Contents};
use crate::context::ServiceContext;
use crate::error::{CommandError, CommandName, Result};
use crate::options::{CallArgs, WriteOptions};
use crate::ports::{BackendError, ErrorCode, WriteRequest};

use super::{log_outcome, validate_path};

/// Writes `contents` to `path`. Writes are never retried.
///
/// Bytes are sent as base64 with the encoding forced to `base64`; objects
/// and arrays are sent as indented JSON.
///
/// # Errors
///
/// Returns [`CommandError::InvalidArgument`] for an empty path,
/// [`CommandError::InvalidContents`] for scalar structured contents,
/// [`CommandError::TimedOut`] when the write outlives the configured write
/// timeout, and [`CommandError::UnexpectedBackend`] for any other failure.
pub async fn write_file(
    ctx: &ServiceContext,
    path: &str,
    contents: Contents,
    args: CallArgs,
) -> Result<()> {
    let options = WriteOptions::normalize(args);
    let mut entry = options.log.then(|| LogEntry::new(CommandName::WriteFile, path));

    let result = write(ctx, path, contents, options, entry.as_mut()).await;

    if let Some(entry) = entry {
        ctx.log.record(entry, log_outcome(&result));
    }
    result
}

async fn write(
    ctx: &ServiceContext,
    file: &str,
    contents: Contents,
    options: WriteOptions,
    entry: Option<&mut LogEntry>,
) -> Result<()> {
    validate_path(CommandName::WriteFile, file)?;

    let payload = content::encode(contents, options.encoding)
        .map_err(|invalid| CommandError::InvalidContents { contents: invalid.rendered })?;
    let request = WriteRequest {
        path: file.to_string(),
        contents: payload.contents,
        encoding: payload.encoding,
        flag: options.flag,
    };

    let timeout = ctx.config.write_timeout;
    let result = tokio::time::timeout(timeout, ctx.backend.write_file(&request))
        .await
        .unwrap_or_else(|_| {
            let message = format!("write did not finish within {}ms", timeout.as_millis());
            Err(BackendError::new(ErrorCode::TimedOut, None, message))
        });
    let response = classify_write(file, timeout.as_millis(), result)?;

    tracing::debug!(file, file_path = %response.file_path, flag = %request.flag, "File written");
    if let Some(entry) = entry {
        entry.set_prop("File Path", response.file_path);
        entry.set_prop("Contents", preview_text(&response.contents));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::adapters::memory::{BackendCall, InMemoryBackend, ManualClock};
    use crate::command_log::LogOutcome;
    use crate::config::Config;
    use crate::error::Action;
    use crate::options::{Encoding, UserOptions, WriteFlag};

    fn context(backend: &Arc<InMemoryBackend>) -> ServiceContext {
        ServiceContext::new(
            Box::new(Arc::clone(backend)),
            Box::new(ManualClock::new()),
            Config::default(),
        )
    }

    fn only_write(backend: &InMemoryBackend) -> WriteRequest {
        match backend.calls().as_slice() {
            [BackendCall::Write(request)] => request.clone(),
            other => panic!("expected exactly one write, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_is_written_with_defaults() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        write_file(&ctx, "out.txt", "hello".into(), CallArgs::new()).await.unwrap();

        let request = only_write(&backend);
        assert_eq!(request.encoding, Encoding::utf8());
        assert_eq!(request.flag, WriteFlag::Write);
        assert_eq!(backend.contents("out.txt"), Some(b"hello".to_vec()));

        let entry = &ctx.log.entries()[0];
        assert_eq!(entry.prop("File Path"), Some("/project/out.txt"));
        assert_eq!(entry.outcome, LogOutcome::Passed);
    }

    #[tokio::test]
    async fn append_flag_issues_one_utf8_write() {
        let backend = Arc::new(InMemoryBackend::new().with_file("log.txt", "a"));
        let ctx = context(&backend);
        let args = CallArgs::options(UserOptions {
            flag: Some(WriteFlag::Append),
            ..UserOptions::default()
        });
        write_file(&ctx, "log.txt", "b".into(), args).await.unwrap();

        let request = only_write(&backend);
        assert_eq!(request.flag, WriteFlag::Append);
        assert_eq!(request.encoding, Encoding::utf8());
        assert_eq!(backend.contents("log.txt"), Some(b"ab".to_vec()));
    }

    #[tokio::test]
    async fn bytes_force_base64_encoding() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        write_file(&ctx, "blob.bin", vec![0u8, 1, 2, 255].into(), CallArgs::encoding("ascii"))
            .await
            .unwrap();

        let request = only_write(&backend);
        assert_eq!(request.contents, "AAEC/w==");
        assert_eq!(request.encoding, Encoding::Text("base64".into()));
        assert_eq!(backend.contents("blob.bin"), Some(vec![0, 1, 2, 255]));
    }

    #[tokio::test]
    async fn structured_values_are_indented_json() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        let value = json!({"name": "x", "tags": [1, 2]});
        write_file(&ctx, "data.json", value.into(), CallArgs::new()).await.unwrap();

        let expected = "{\n  \"name\": \"x\",\n  \"tags\": [\n    1,\n    2\n  ]\n}";
        assert_eq!(only_write(&backend).contents, expected);
    }

    #[tokio::test]
    async fn scalar_contents_are_invalid_without_backend_call() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        let err = write_file(&ctx, "n.txt", json!(42).into(), CallArgs::new()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "`writeFile()` must be passed a non-empty string, an object, or an array as its 2nd \
             argument. You passed: `42`."
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_path_is_invalid_without_backend_call() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        let err = write_file(&ctx, "", "x".into(), CallArgs::new()).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument { cmd: CommandName::WriteFile, .. }));
        assert!(backend.calls().is_empty());
        assert!(matches!(ctx.log.entries()[0].outcome, LogOutcome::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_write_times_out() {
        let backend = Arc::new(InMemoryBackend::new().slow_writes(Duration::from_secs(60)));
        let ctx = context(&backend);
        let err = write_file(&ctx, "slow.txt", "x".into(), CallArgs::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "`writeFile(\"slow.txt\")` timed out after waiting `30000ms`.");
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn backend_timeout_code_is_timed_out() {
        let failure = BackendError::new(ErrorCode::TimedOut, None, "socket hang up");
        let backend = Arc::new(InMemoryBackend::new().failing_writes(failure));
        let ctx = context(&backend);
        let err = write_file(&ctx, "a.txt", "x".into(), CallArgs::new()).await.unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { timeout_ms: 30_000, .. }));
    }

    #[tokio::test]
    async fn other_failures_are_unexpected() {
        let failure = BackendError::new(
            ErrorCode::Other("EACCES".into()),
            Some("/project/locked.txt".into()),
            "permission denied",
        );
        let backend = Arc::new(InMemoryBackend::new().failing_writes(failure));
        let ctx = context(&backend);
        let err = write_file(&ctx, "locked.txt", "x".into(), CallArgs::new()).await.unwrap_err();
        assert!(matches!(err, CommandError::UnexpectedBackend { action: Action::Write, .. }));
        assert!(err.to_string().contains("`/project/locked.txt`"));
    }

    #[tokio::test]
    async fn log_false_records_nothing() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        let args = CallArgs::options(UserOptions { log: Some(false), ..UserOptions::default() });
        write_file(&ctx, "quiet.txt", "x".into(), args).await.unwrap();
        assert!(ctx.log.entries().is_empty());
    }
}
