//! Service context bundling the port trait objects and shared state.

use std::path::Path;

use crate::adapters::live::{LiveClock, LiveFileBackend};
use crate::adapters::recording::{RecordingBackend, RecordingClock};
use crate::adapters::replaying::{ReplayingBackend, ReplayingClock};
use crate::cassette::config::CassetteConfig;
use crate::cassette::session::RecordingSession;
use crate::cassette::CassetteError;
use crate::command_log::CommandLog;
use crate::config::Config;
use crate::ports::{Clock, FileBackend};

/// Everything a command needs besides its own arguments.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying). Nothing here is per-invocation state.
pub struct ServiceContext {
    /// Backend performing file reads and writes.
    pub backend: Box<dyn FileBackend>,
    /// Clock the retry budget is measured against.
    pub clock: Box<dyn Clock>,
    /// Timeouts, retry interval and project root.
    pub config: Config,
    /// Sink for command log entries.
    pub log: CommandLog,
}

impl ServiceContext {
    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn new(backend: Box<dyn FileBackend>, clock: Box<dyn Clock>, config: Config) -> Self {
        Self { backend, clock, config, log: CommandLog::new() }
    }

    /// Creates a live context over the host file system.
    #[must_use]
    pub fn live(config: Config) -> Self {
        let backend = LiveFileBackend::new(config.project_root.clone());
        Self::new(Box::new(backend), Box::new(LiveClock), config)
    }

    /// Creates a live context whose port interactions are recorded into a
    /// new session under `record_dir`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording_at(
        config: Config,
        record_dir: &Path,
    ) -> Result<(Self, RecordingSession), CassetteError> {
        let session = RecordingSession::new(record_dir, &config.project_root)?;
        let backend = RecordingBackend::new(
            Box::new(LiveFileBackend::new(config.project_root.clone())),
            session.backend.clone(),
        );
        let clock = RecordingClock::new(Box::new(LiveClock), session.clock.clone());
        Ok((Self::new(Box::new(backend), Box::new(clock), config), session))
    }

    /// Creates a replaying context from a monolithic cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path, config: Config) -> Result<Self, CassetteError> {
        Self::replaying_from(&CassetteConfig::monolithic(path), config)
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a cassette fall back to an unconfigured replayer: the
    /// backend fails every call and the clock runs virtually.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(
        cassettes: &CassetteConfig,
        config: Config,
    ) -> Result<Self, CassetteError> {
        let replayers = cassettes.load_all()?;
        let backend =
            replayers.backend.map_or_else(ReplayingBackend::unconfigured, ReplayingBackend::new);
        let clock = replayers.clock.map_or_else(ReplayingClock::unconfigured, ReplayingClock::new);
        Ok(Self::new(Box::new(backend), Box::new(clock), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::options::Encoding;
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            project_root: "/project".into(),
            interactions,
        }
        .save(path)
        .unwrap();
    }

    #[tokio::test]
    async fn replaying_context_from_monolithic_cassette() {
        let dir = std::env::temp_dir().join("fileassert_ctx_test_mono");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("full.cassette.yaml");

        write_cassette(
            &path,
            vec![
                Interaction {
                    seq: 0,
                    port: "clock".into(),
                    method: "now".into(),
                    input: json!(null),
                    output: json!("2024-06-15T10:30:00Z"),
                },
                Interaction {
                    seq: 1,
                    port: "backend".into(),
                    method: "read_file".into(),
                    input: json!({"path": "a.txt", "encoding": "utf8"}),
                    output: json!({"Ok": {"contents": "hello", "file_path": "/project/a.txt"}}),
                },
            ],
        );

        let ctx = ServiceContext::replaying(&path, Config::default()).unwrap();
        assert_eq!(ctx.clock.now().to_rfc3339(), "2024-06-15T10:30:00+00:00");
        let response = ctx.backend.read_file("a.txt", &Encoding::utf8()).await.unwrap();
        assert_eq!(response.contents, "hello");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn replaying_from_per_port_cassettes_falls_back_for_missing_ports() {
        let dir = std::env::temp_dir().join("fileassert_ctx_test_ports");
        std::fs::create_dir_all(&dir).unwrap();

        let clock_path = dir.join("clock.cassette.yaml");
        write_cassette(
            &clock_path,
            vec![Interaction {
                seq: 0,
                port: "clock".into(),
                method: "now".into(),
                input: json!(null),
                output: json!("2024-01-01T00:00:00Z"),
            }],
        );

        let cassettes = CassetteConfig { clock: Some(clock_path), ..CassetteConfig::default() };
        let ctx = ServiceContext::replaying_from(&cassettes, Config::default()).unwrap();
        assert_eq!(ctx.clock.now().to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let err = ctx.backend.read_file("a.txt", &Encoding::utf8()).await.unwrap_err();
        assert!(err.message.contains("no backend cassette configured"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_cassette_file_is_an_error() {
        let result = ServiceContext::replaying(
            Path::new("/nonexistent/fileassert.cassette.yaml"),
            Config::default(),
        );
        assert!(matches!(result, Err(CassetteError::Read { .. })));
    }
}
