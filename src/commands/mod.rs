//! Command handlers and dispatch.

pub mod read_file;
pub mod script;
pub mod write_file;

use std::io::Write as _;

use crate::cassette::session::RecordingSession;
use crate::cli::{Command, WriteFileArgs};
use crate::command_log::LogOutcome;
use crate::config::Config;
use crate::content::ReadContents;
use crate::context::ServiceContext;
use crate::error::{CommandError, CommandName, Result};

pub use read_file::read_file;
pub use write_file::write_file;

/// Dispatch a parsed command to its handler.
///
/// When `FILEASSERT_RECORD` is set to a directory path, all port
/// interactions are recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if configuration is invalid or the selected
/// command fails.
pub fn dispatch(command: &Command) -> std::result::Result<(), String> {
    let config = Config::from_env().map_err(|e| e.to_string())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    let (ctx, session) = match config.record_dir.clone() {
        Some(dir) => {
            let (ctx, session) =
                ServiceContext::recording_at(config, &dir).map_err(|e| e.to_string())?;
            (ctx, Some(session))
        }
        None => (ServiceContext::live(config), None),
    };

    let result = runtime.block_on(dispatch_with_context(command, &ctx));

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
async fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
) -> std::result::Result<(), String> {
    match command {
        Command::ReadFile(args) => {
            let contents =
                read_file(ctx, &args.path, args.call_args(), &args.expectations())
                    .await
                    .map_err(|e| e.to_string())?;
            print_contents(&contents)
        }
        Command::WriteFile(args) => run_write(ctx, args).await,
        Command::Run { script: path } => {
            let steps = script::load(path).map_err(|e| e.to_string())?;
            let reports = script::run_steps(ctx, &steps).await.map_err(|e| e.to_string())?;
            for report in reports {
                let yielded = report.yielded.map(|c| format!(" -> {}", c.preview()));
                println!(
                    "{}. {}(\"{}\"){}",
                    report.index,
                    report.command,
                    report.file,
                    yielded.unwrap_or_default()
                );
            }
            Ok(())
        }
    }
}

async fn run_write(ctx: &ServiceContext, args: &WriteFileArgs) -> std::result::Result<(), String> {
    let contents = args.contents()?;
    write_file(ctx, &args.path, contents, args.call_args()).await.map_err(|e| e.to_string())
}

fn print_contents(contents: &ReadContents) -> std::result::Result<(), String> {
    let mut stdout = std::io::stdout().lock();
    let written = match contents {
        ReadContents::Text(text) => writeln!(stdout, "{text}"),
        ReadContents::Bytes(bytes) => stdout.write_all(bytes),
        ReadContents::Absent => Ok(()),
    };
    written.map_err(|e| format!("Failed to write to stdout: {e}"))
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> std::result::Result<(), String> {
    let output_dir = session.finish().map_err(|e| e.to_string())?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}

/// Rejects an empty path before any backend call.
fn validate_path(cmd: CommandName, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CommandError::invalid_argument(cmd, path));
    }
    Ok(())
}

/// Maps a command result to the outcome stored in its log entry.
fn log_outcome<T>(result: &Result<T>) -> LogOutcome {
    match result {
        Ok(_) => LogOutcome::Passed,
        Err(err) => LogOutcome::Failed(err.to_string()),
    }
}
