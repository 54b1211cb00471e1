pub mod client;
pub mod error;
pub mod stats;
pub mod transmission;

pub use client::{API_KEY_HEADER, HttpClient, SenderConfig};
pub use error::DeliveryError;
pub use stats::{ClientStats, StatsSnapshot};
pub use transmission::EntryTransmitter;
