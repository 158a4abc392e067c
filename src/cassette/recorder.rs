//! Records interactions into a cassette file.

use std::path::PathBuf;

use chrono::Utc;

use super::format::{Cassette, Interaction};
use super::CassetteError;

/// Records interactions and writes them as a YAML cassette file.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    project_root: String,
    interactions: Vec<Interaction>,
    next_seq: u64,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        project_root: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            project_root: project_root.into(),
            interactions: Vec::new(),
            next_seq: 0,
        }
    }

    /// Record an interaction. The `seq` field is assigned automatically.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        self.interactions.push(Interaction {
            seq: self.next_seq,
            port: port.into(),
            method: method.into(),
            input,
            output,
        });
        self.next_seq += 1;
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Finish recording and write the cassette YAML file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, CassetteError> {
        let cassette = Cassette {
            name: self.name,
            recorded_at: Utc::now(),
            project_root: self.project_root,
            interactions: self.interactions,
        };
        cassette.save(&self.path)?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_and_finish() {
        let dir = std::env::temp_dir().join("fileassert_recorder_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("backend.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "write-then-read", "/project");
        recorder.record(
            "backend",
            "write_file",
            json!({"path": "a.txt", "contents": "x", "encoding": "utf8", "flag": "w"}),
            json!({"Ok": {"contents": "x", "file_path": "/project/a.txt"}}),
        );
        recorder.record(
            "backend",
            "read_file",
            json!({"path": "a.txt", "encoding": "utf8"}),
            json!({"Ok": {"contents": "x", "file_path": "/project/a.txt"}}),
        );
        assert_eq!(recorder.len(), 2);

        let result_path = recorder.finish().expect("finish should succeed");
        assert_eq!(result_path, path);

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.name, "write-then-read");
        assert_eq!(cassette.project_root, "/project");
        assert_eq!(cassette.interactions[0].seq, 0);
        assert_eq!(cassette.interactions[1].seq, 1);
        assert_eq!(cassette.interactions[1].method, "read_file");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
