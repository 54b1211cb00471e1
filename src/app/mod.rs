pub mod client;
pub mod config;
pub mod logging;

pub use client::{FlushOutcome, LifecycleState, LogClient, ShutdownReport};
pub use config::{Config, ConfigError, RequeueMode};
pub use logging::{LogFormat, init_logging};
