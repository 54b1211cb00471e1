//! Buffering and flush scheduling.
//!
//! Accepted entries accumulate in a [`LogBuffer`]; a flush takes the whole
//! buffer as one [`Batch`] before any I/O starts. Flushes are triggered by
//! the size threshold or by the periodic [`FlushTimer`].

pub mod batch;
pub mod queue;
pub mod timer;

pub use batch::{Batch, BatchTrigger};
pub use queue::LogBuffer;
pub use timer::FlushTimer;
