//! In-memory adapters for tests and dry runs.

pub mod backend;
pub mod clock;

pub use backend::{BackendCall, InMemoryBackend};
pub use clock::ManualClock;
