//! Per-command log entries, the `log` option's sink.

use std::sync::Mutex;
use std::time::Duration;

use crate::error::CommandName;

/// How a logged command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    /// The command yielded normally.
    Passed,
    /// The command failed with this message.
    Failed(String),
}

/// One command's log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Which command ran.
    pub command: CommandName,
    /// The path argument as the caller gave it.
    pub message: String,
    /// Retry budget shown alongside the entry; writes carry none.
    pub timeout: Option<Duration>,
    /// Details in insertion order, e.g. `File Path` and `Contents`.
    pub props: Vec<(String, String)>,
    /// How the command ended.
    pub outcome: LogOutcome,
}

impl LogEntry {
    /// Starts an entry that has not failed yet.
    pub fn new(command: CommandName, message: impl Into<String>) -> Self {
        Self {
            command,
            message: message.into(),
            timeout: None,
            props: Vec::new(),
            outcome: LogOutcome::Passed,
        }
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets a detail, replacing any earlier value under the same name.
    pub fn set_prop(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.props.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.props.push((name.to_string(), value)),
        }
    }

    /// Looks up a detail by name.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.props.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

/// Append-only sink for command log entries, shared by every invocation
/// on a context.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl CommandLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finishes `entry` with `outcome`, emits it as a tracing event and
    /// stores it.
    pub fn record(&self, mut entry: LogEntry, outcome: LogOutcome) {
        let props = entry
            .props
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let (command, file) = (entry.command, entry.message.as_str());
        match &outcome {
            LogOutcome::Passed => {
                tracing::info!(%command, file, %props, "Command passed");
            }
            LogOutcome::Failed(error) => {
                tracing::warn!(%command, file, %props, %error, "Command failed");
            }
        }
        entry.outcome = outcome;
        self.entries.lock().expect("command log lock poisoned").push(entry);
    }

    /// Snapshot of every entry recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("command log lock poisoned").clone()
    }
}
