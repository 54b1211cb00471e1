pub mod engine;
pub mod retry;

pub use engine::{BatchOutcome, DeliveryEngine};
pub use retry::{JITTER_FRACTION, MAX_BACKOFF, RetryPolicy};
