//! Frame timing and throughput reporting.
//!
//! One `FrameClock` ticks per presented frame; a `ThroughputMeter` folds the
//! ticks into periodic frame-rate reports. Neither reads the clock on its own
//! when given an `Instant`, which keeps both testable.

mod frame_clock;
mod throughput;

pub use frame_clock::{FrameClock, FrameTime};
pub use throughput::{ThroughputMeter, ThroughputReport};
