//! Adapter implementations of the ports.

pub mod encoding;
pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
