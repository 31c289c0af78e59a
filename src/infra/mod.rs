//! In-process adapters and operational plumbing.

pub mod memory;
pub mod telemetry;

pub use memory::{InProcTransport, MemoryPostStore, RecordingNavigator};
