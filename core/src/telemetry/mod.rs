//! telemetry/mod.rs
//! Counters, stage timers and the immutable snapshot of one packaging run.
//!
//! Notes:
//! - Counters are plain integers owned by the run; nothing is shared or atomic.
//! - The snapshot is attached to `ReleaseSummary` and can be emitted as JSON.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
