//! Recording session managing per-port cassette recorders.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;
use super::CassetteError;

/// Manages per-port [`CassetteRecorder`] instances for a recording session.
///
/// Each port gets its own recorder writing to a separate cassette file in a
/// timestamped directory under the configured record directory.
pub struct RecordingSession {
    /// Recorder for backend interactions.
    pub backend: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for clock interactions.
    pub clock: Arc<Mutex<CassetteRecorder>>,
    /// Output directory containing all cassette files.
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Create a new recording session in `<record_dir>/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory already exists or cannot
    /// be created.
    pub fn new(record_dir: &Path, project_root: &Path) -> Result<Self, CassetteError> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let output_dir = record_dir.join(&timestamp);

        if output_dir.exists() {
            return Err(CassetteError::Session(format!(
                "Cassette directory already exists: {}",
                output_dir.display()
            )));
        }
        std::fs::create_dir_all(&output_dir)
            .map_err(|source| CassetteError::Write { path: output_dir.clone(), source })?;

        let root = project_root.display().to_string();
        let make_recorder = |port: &str| -> Arc<Mutex<CassetteRecorder>> {
            let path = output_dir.join(format!("{port}.cassette.yaml"));
            let name = format!("{timestamp}-{port}");
            Arc::new(Mutex::new(CassetteRecorder::new(path, name, root.as_str())))
        };

        Ok(Self { backend: make_recorder("backend"), clock: make_recorder("clock"), output_dir })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Finish all recorders and write cassette files to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if a recording adapter is still alive or any
    /// cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, CassetteError> {
        fn finish_one(arc: Arc<Mutex<CassetteRecorder>>, port: &str) -> Result<(), CassetteError> {
            let session_error = CassetteError::Session;
            let recorder = Arc::try_unwrap(arc)
                .map_err(|_| {
                    session_error(format!("Recording adapter for {port} still has references"))
                })?
                .into_inner()
                .map_err(|e| session_error(format!("Recorder lock for {port} poisoned: {e}")))?;
            recorder.finish()?;
            Ok(())
        }

        finish_one(self.backend, "backend")?;
        finish_one(self.clock, "clock")?;
        Ok(self.output_dir)
    }
}
