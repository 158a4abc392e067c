//! Cassette format for recording and replaying port interactions.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;

use std::path::PathBuf;

/// Errors raised while loading, saving, or replaying cassettes.
#[derive(Debug, thiserror::Error)]
pub enum CassetteError {
    #[error("Failed to read cassette file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cassette file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse cassette file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize cassette {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(
        "Cassette exhausted: no more interactions for port={port:?} method={method:?}. Available: [{available}]"
    )]
    Exhausted { port: String, method: String, available: String },

    #[error("Recording session error: {0}")]
    Session(String),
}
