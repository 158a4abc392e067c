//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the command core and an
//! external system (file backend, time). Implementations live in
//! `src/adapters/`.

pub mod backend;
pub mod clock;

pub use backend::{BackendError, BackendFuture, ErrorCode, FileBackend, FileResponse, WriteRequest};
pub use clock::{Clock, SleepFuture};
