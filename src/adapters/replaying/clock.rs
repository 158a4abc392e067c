//! Replaying adapter for the `Clock` port.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::next_output;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::clock::{Clock, SleepFuture};

/// Replays recorded clock values from a cassette.
///
/// Sleeps never block. Once the recorded `now` values run out (or none were
/// recorded) the clock continues virtually from the last value it served,
/// advanced by every sleep since.
pub struct ReplayingClock {
    replayer: Option<Mutex<CassetteReplayer>>,
    virtual_now: Mutex<DateTime<Utc>>,
}

impl ReplayingClock {
    /// Creates a new replaying clock from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self {
            replayer: Some(Mutex::new(replayer)),
            virtual_now: Mutex::new(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    /// A purely virtual clock starting at the Unix epoch.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None, virtual_now: Mutex::new(DateTime::<Utc>::UNIX_EPOCH) }
    }

    fn recorded_now(&self) -> Option<DateTime<Utc>> {
        let output = next_output(self.replayer.as_ref()?, "clock", "now").ok()?;
        serde_json::from_value(output).ok()
    }
}

impl Clock for ReplayingClock {
    fn now(&self) -> DateTime<Utc> {
        let recorded = self.recorded_now();
        let mut virtual_now = self.virtual_now.lock().expect("virtual clock lock poisoned");
        if let Some(now) = recorded {
            *virtual_now = now;
        }
        *virtual_now
    }

    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        if let Some(replayer) = &self.replayer {
            let _ = next_output(replayer, "clock", "sleep");
        }
        {
            let mut virtual_now = self.virtual_now.lock().expect("virtual clock lock poisoned");
            if let Ok(step) = chrono::Duration::from_std(duration) {
                *virtual_now += step;
            }
        }
        Box::pin(std::future::ready(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use serde_json::json;

    fn now_at(seq: u64, ts: &str) -> Interaction {
        Interaction {
            seq,
            port: "clock".into(),
            method: "now".into(),
            input: json!(null),
            output: json!(ts),
        }
    }

    fn make_replayer(interactions: Vec<Interaction>) -> CassetteReplayer {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            project_root: "/project".into(),
            interactions,
        };
        CassetteReplayer::new(&cassette)
    }

    #[test]
    fn serves_recorded_times_in_order() {
        let clock = ReplayingClock::new(make_replayer(vec![
            now_at(0, "2024-01-01T00:00:00Z"),
            now_at(1, "2024-01-01T00:01:00Z"),
        ]));
        let t1 = clock.now();
        let t2 = clock.now();
        assert_eq!(t1.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(t2 - t1, chrono::Duration::minutes(1));
    }

    #[tokio::test]
    async fn continues_virtually_after_exhaustion() {
        let clock = ReplayingClock::new(make_replayer(vec![now_at(0, "2024-01-01T00:00:00Z")]));
        let start = clock.now();
        clock.sleep(Duration::from_millis(50)).await;
        assert_eq!(clock.now() - start, chrono::Duration::milliseconds(50));
    }

    #[tokio::test]
    async fn unconfigured_clock_is_virtual() {
        let clock = ReplayingClock::unconfigured();
        assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH);
        clock.sleep(Duration::from_secs(2)).await;
        assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(2));
    }
}
