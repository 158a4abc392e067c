//! `readFile`: poll a file until its expectations hold.

use crate::assertion::poll::{PollState, Poller};
use crate::assertion::{AssertionError, Expectations, FailureKind, Verdict};
use crate::classify::{classify_read, ReadOutcome};
use crate::command_log::LogEntry;
use crate::content::{self, ReadContents};
use crate::context::ServiceContext;
use crate::error::{Action, CommandError, CommandName, Result};
use crate::options::{CallArgs, ReadOptions};

use super::{log_outcome, validate_path};

/// Reference attached to existence failures.
pub const EXISTENCE_REFERENCE: &str = "readFile#existence";

/// Reads `path`, retrying until `expectations` hold or the timeout expires.
///
/// A missing file is not an error by itself: it yields
/// [`ReadContents::Absent`] when the caller asserted `not.exist`, and is
/// retried otherwise.
///
/// # Errors
///
/// Returns [`CommandError::InvalidArgument`] for an empty path,
/// [`CommandError::UnexpectedBackend`] for backend failures other than
/// "not found", and [`CommandError::Assertion`] when the expectations are
/// contradictory or still fail once the timeout expires.
pub async fn read_file(
    ctx: &ServiceContext,
    path: &str,
    args: CallArgs,
    expectations: &Expectations,
) -> Result<ReadContents> {
    let options = ReadOptions::normalize(args, &ctx.config);
    let mut entry = options
        .log
        .then(|| LogEntry::new(CommandName::ReadFile, path).with_timeout(options.timeout));

    let result = poll(ctx, path, &options, expectations, entry.as_mut()).await;

    if let Some(entry) = entry {
        ctx.log.record(entry, log_outcome(&result));
    }
    result
}

async fn poll(
    ctx: &ServiceContext,
    file: &str,
    options: &ReadOptions,
    expectations: &Expectations,
    mut entry: Option<&mut LogEntry>,
) -> Result<ReadContents> {
    validate_path(CommandName::ReadFile, file)?;

    let mut poller = Poller::start(ctx.clock.as_ref(), options.timeout, ctx.config.retry_interval);
    loop {
        poller.begin_attempt();
        let response = ctx.backend.read_file(file, &options.encoding).await;
        let ReadOutcome { contents, file_path } = classify_read(file, response)?;
        let contents = content::decode(contents, &options.encoding).map_err(|message| {
            CommandError::UnexpectedBackend {
                cmd: CommandName::ReadFile,
                action: Action::Read,
                file: file.to_string(),
                file_path: file_path.clone(),
                message,
            }
        })?;

        if let Some(entry) = entry.as_deref_mut() {
            entry.set_prop("File Path", file_path.clone().unwrap_or_default());
            entry.set_prop("Contents", contents.preview());
            entry.set_prop("Attempts", poller.attempts().to_string());
        }

        poller.begin_evaluation();
        let verdict = match expectations.verify(&contents, true) {
            Verdict::Retryable(err) if err.is_existence() => {
                Verdict::Retryable(existence_error(file, file_path.as_deref(), &contents))
            }
            verdict => verdict,
        };

        match poller.evaluated(verdict).clone() {
            PollState::Satisfied => {
                tracing::debug!(file, attempts = poller.attempts(), "Expectations satisfied");
                return Ok(contents);
            }
            PollState::Failed(err) => return Err(err.into()),
            PollState::RetryScheduled(_) | PollState::Attempting | PollState::Evaluating => {
                poller.wait().await;
            }
        }
    }
}

/// Rewrites an existence failure with the file and its resolved path.
fn existence_error(file: &str, file_path: Option<&str>, contents: &ReadContents) -> AssertionError {
    let file_path = file_path.unwrap_or(file);
    let message = if contents.is_present() {
        format!(
            "`readFile(\"{file}\")` failed because the file exists when expected not to exist at the following path:\n\n`{file_path}`"
        )
    } else {
        format!(
            "`readFile(\"{file}\")` failed because the file does not exist at the following path:\n\n`{file_path}`"
        )
    };
    AssertionError {
        kind: FailureKind::Existence,
        message,
        reference: Some(EXISTENCE_REFERENCE.to_string()),
    }
}
