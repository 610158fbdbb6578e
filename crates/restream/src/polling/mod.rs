//! Long-polling manager.
//!
//! Emulates push notification over plain request/response HTTP by
//! repeating a request and dispatching each successful body, until a
//! sentinel response header signals that no more data will arrive.

mod config;
mod manager;

pub use config::{DEFAULT_END_OF_STREAM_HEADER, PollConfig};
pub use manager::PollingManager;
