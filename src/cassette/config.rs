//! Cassette configuration for per-port replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;
use super::CassetteError;

/// Per-port cassette file paths. Ports without a path are served by a
/// fallback during replay: the backend refuses every call and the clock
/// runs virtually.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Path to the backend port cassette file.
    pub backend: Option<PathBuf>,
    /// Path to the clock port cassette file.
    pub clock: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the backend port.
    pub backend: Option<CassetteReplayer>,
    /// Replayer for the clock port.
    pub clock: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Uses the same monolithic cassette for every port.
    #[must_use]
    pub fn monolithic(path: &Path) -> Self {
        Self { backend: Some(path.to_path_buf()), clock: Some(path.to_path_buf()) }
    }

    /// Reads the per-port cassettes written by a recording session into `dir`.
    #[must_use]
    pub fn from_session_dir(dir: &Path) -> Self {
        let existing = |port: &str| {
            let path = dir.join(format!("{port}.cassette.yaml"));
            path.exists().then_some(path)
        };
        Self { backend: existing("backend"), clock: existing("clock") }
    }

    /// Load a single cassette file and create a replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_port_cassette(path: &Path) -> Result<CassetteReplayer, CassetteError> {
        Ok(CassetteReplayer::new(&Cassette::load(path)?))
    }

    /// Load all configured cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, CassetteError> {
        Ok(PortReplayers {
            backend: self.backend.as_deref().map(Self::load_port_cassette).transpose()?,
            clock: self.clock.as_deref().map(Self::load_port_cassette).transpose()?,
        })
    }
}
