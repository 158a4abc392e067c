//! Retry-driven file assertions.
//!
//! `readFile` polls a file through a [`ports::FileBackend`] until a set of
//! expectations holds or a timeout expires; `writeFile` normalizes text,
//! bytes or structured contents and writes them in a single attempt.

pub mod adapters;
pub mod assertion;
pub mod cassette;
pub mod classify;
pub mod cli;
pub mod command_log;
pub mod commands;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod logging;
pub mod options;
pub mod ports;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["fileassert", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_reports_missing_script() {
        let err = run(["fileassert", "run", "/nonexistent/fileassert-steps.yaml"]).unwrap_err();
        assert!(err.contains("Failed to read script"));
    }
}
