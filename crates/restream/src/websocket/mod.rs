//! WebSocket client.
//!
//! Full-duplex connection ownership with an explicit lifecycle state
//! machine, a retry-budgeted connect, a background receive loop, and
//! broadcast events for external observers.

mod client;
mod config;
mod events;

pub use client::WsClient;
pub use config::WsConfig;
pub use events::{ConnectionState, WsEvent};
