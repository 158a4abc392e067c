//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::assertion::{Assertion, Expectations};
use crate::content::Contents;
use crate::options::{CallArgs, UserOptions, WriteFlag};

/// Top-level CLI parser for `fileassert`.
#[derive(Debug, Parser)]
#[command(name = "fileassert", version, about = "Retry-driven file assertions")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a file, retrying until every assertion passes.
    ReadFile(ReadFileArgs),
    /// Write a file in a single attempt.
    WriteFile(WriteFileArgs),
    /// Run a YAML script of readFile/writeFile steps.
    Run {
        /// Path to the script.
        script: PathBuf,
    },
}

/// Arguments for `read-file`.
#[derive(Debug, Args)]
pub struct ReadFileArgs {
    /// File to read, relative to the project root.
    pub path: String,
    /// Text encoding used to decode the file.
    #[arg(long, conflicts_with = "raw")]
    pub encoding: Option<String>,
    /// Yield raw bytes instead of text.
    #[arg(long)]
    pub raw: bool,
    /// Retry budget in milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,
    /// Do not record a command log entry.
    #[arg(long)]
    pub no_log: bool,
    /// Assertion to retry until it passes, e.g. `exist` or `contain=ok`.
    #[arg(long, value_name = "ASSERTION")]
    pub should: Vec<Assertion>,
}

impl ReadFileArgs {
    /// Positional arguments as a direct call would pass them.
    #[must_use]
    pub fn call_args(&self) -> CallArgs {
        let call = if self.raw {
            CallArgs::raw()
        } else {
            self.encoding.clone().map_or_else(CallArgs::new, CallArgs::encoding)
        };
        call.with_options(UserOptions {
            timeout: self.timeout,
            log: self.no_log.then_some(false),
            ..UserOptions::default()
        })
    }

    /// The `--should` assertions.
    #[must_use]
    pub fn expectations(&self) -> Expectations {
        Expectations::new(self.should.clone())
    }
}

/// Arguments for `write-file`.
#[derive(Debug, Args)]
pub struct WriteFileArgs {
    /// File to write, relative to the project root.
    pub path: String,
    /// Contents to write.
    #[arg(required_unless_present = "from", conflicts_with = "from")]
    pub contents: Option<String>,
    /// Parse the contents as JSON and write them as indented JSON.
    #[arg(long)]
    pub json: bool,
    /// Write the bytes of this local file instead.
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,
    /// Encoding the backend applies to the contents.
    #[arg(long)]
    pub encoding: Option<String>,
    /// File-system flag: w, a, wx, ax, w+ or a+.
    #[arg(long)]
    pub flag: Option<WriteFlag>,
    /// Do not record a command log entry.
    #[arg(long)]
    pub no_log: bool,
}

impl WriteFileArgs {
    /// Positional arguments as a direct call would pass them.
    #[must_use]
    pub fn call_args(&self) -> CallArgs {
        let call = self.encoding.clone().map_or_else(CallArgs::new, CallArgs::encoding);
        call.with_options(UserOptions {
            flag: self.flag,
            log: self.no_log.then_some(false),
            ..UserOptions::default()
        })
    }

    /// Builds the contents from the positional text, `--json` or `--from`.
    ///
    /// # Errors
    ///
    /// Returns an error if `--from` cannot be read or `--json` text does not
    /// parse.
    pub fn contents(&self) -> Result<Contents, String> {
        if let Some(from) = &self.from {
            let bytes =
                std::fs::read(from).map_err(|e| format!("Failed to read {}: {e}", from.display()))?;
            return Ok(Contents::Bytes(bytes));
        }
        let text = self.contents.clone().unwrap_or_default();
        if self.json {
            let value = serde_json::from_str(&text)
                .map_err(|e| format!("--json contents are not valid JSON: {e}"))?;
            return Ok(Contents::Structured(value));
        }
        Ok(Contents::Text(text))
    }
}
