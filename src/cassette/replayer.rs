//! Replays recorded interactions from a cassette.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};
use super::CassetteError;

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays interactions from a loaded cassette, serving them sequentially
/// per port/method pair.
pub struct CassetteReplayer {
    /// Per port+method queue of interactions (in order).
    queues: HashMap<PortMethodKey, Vec<Interaction>>,
    /// Per port+method cursor tracking position.
    cursors: HashMap<PortMethodKey, usize>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push(interaction.clone());
        }
        Self { queues, cursors: HashMap::new() }
    }

    /// Return the next interaction for the given port and method.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::Exhausted`] if no interactions remain for
    /// the pair, listing the pairs that were recorded.
    pub fn next_interaction(
        &mut self,
        port: &str,
        method: &str,
    ) -> Result<&Interaction, CassetteError> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };
        let cursor = self.cursors.entry(key.clone()).or_insert(0);

        match self.queues.get(&key).and_then(|queue| queue.get(*cursor)) {
            Some(interaction) => {
                *cursor += 1;
                Ok(interaction)
            }
            None => {
                let mut available: Vec<String> =
                    self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
                available.sort();
                Err(CassetteError::Exhausted {
                    port: port.to_string(),
                    method: method.to_string(),
                    available: available.join(", "),
                })
            }
        }
    }

    /// Number of interactions not yet served for the pair.
    #[must_use]
    pub fn remaining(&self, port: &str, method: &str) -> usize {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };
        let total = self.queues.get(&key).map_or(0, Vec::len);
        total.saturating_sub(self.cursors.get(&key).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output }
    }

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            project_root: "/project".into(),
            interactions,
        }
    }

    #[test]
    fn serves_each_pair_in_order() {
        let cassette = make_cassette(vec![
            interaction(0, "backend", "read_file", json!("first")),
            interaction(1, "clock", "now", json!("2024-01-01T00:00:00Z")),
            interaction(2, "backend", "read_file", json!("second")),
        ]);
        let mut replayer = CassetteReplayer::new(&cassette);

        assert_eq!(replayer.remaining("backend", "read_file"), 2);
        assert_eq!(replayer.next_interaction("backend", "read_file").unwrap().seq, 0);
        assert_eq!(replayer.next_interaction("clock", "now").unwrap().seq, 1);
        let second = replayer.next_interaction("backend", "read_file").unwrap();
        assert_eq!(second.output, json!("second"));
        assert_eq!(replayer.remaining("backend", "read_file"), 0);
    }

    #[test]
    fn exhausted_pair_lists_available_pairs() {
        let cassette = make_cassette(vec![interaction(0, "backend", "write_file", json!(null))]);
        let mut replayer = CassetteReplayer::new(&cassette);
        replayer.next_interaction("backend", "write_file").unwrap();

        let err = replayer.next_interaction("backend", "write_file").unwrap_err();
        assert!(err.to_string().contains("Cassette exhausted"));

        let err = replayer.next_interaction("clock", "now").unwrap_err();
        assert!(err.to_string().contains("backend::write_file"));
    }
}
