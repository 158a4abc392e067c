//! Replaying adapters that replay recorded interactions.

pub mod backend;
pub mod clock;

pub use backend::ReplayingBackend;
pub use clock::ReplayingClock;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::CassetteError;

/// Takes the next recorded output for a port/method pair.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, CassetteError> {
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    Ok(guard.next_interaction(port, method)?.output.clone())
}

/// Decodes an output written by `recording::record_result`.
///
/// Expects `{"Ok": <value>}` or `{"Err": <error>}`.
pub(crate) fn replay_result<T, E>(output: serde_json::Value) -> Result<Result<T, E>, String>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    serde_json::from_value(output).map_err(|e| format!("malformed recorded result: {e}"))
}
