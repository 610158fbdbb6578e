//! Server-Sent-Events manager.
//!
//! Implements the `text/event-stream` line protocol: `field: value` lines,
//! `:`-prefixed comments, and blank-line event separators. The manager
//! opens one streaming GET/POST, parses the body incrementally, and
//! reconnects on termination using server-supplied (`retry:`) or
//! configured retry intervals.

mod config;
mod manager;
mod parser;
mod record;

pub use config::SseConfig;
pub use manager::SseManager;
pub use parser::{LineBuffer, apply_line};
pub use record::SseEvent;
