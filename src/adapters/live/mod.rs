//! Live adapters for real external interactions.

pub mod backend;
pub mod clock;

pub use backend::LiveFileBackend;
pub use clock::LiveClock;
