//! Capability interfaces for handler-object dispatch.
//!
//! Each manager accepts at most one handler object implementing the
//! capability trait(s) it cares about. Every method has a no-op default so
//! implementors only override the subset they need. Handlers are resolved
//! once at manager construction, never per item.

use crate::{error::TransportError, sse::SseEvent, transfer::ProgressRecord};

/// Receives sampled progress records during a file transfer.
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, _record: &ProgressRecord) {}
}

/// Receives transfer lifecycle notifications.
pub trait TransferHandler: Send + Sync {
    fn on_started(&self) {}
    fn on_completed(&self) {}
    fn on_failed(&self, _error: &TransportError) {}
}

/// Receives one response body per successful long-polling cycle.
pub trait DataReceivedHandler: Send + Sync {
    fn on_data(&self, _data: &str) {}
}

/// Receives SSE lifecycle and event notifications.
pub trait SseHandler: Send + Sync {
    /// Called once per successful (re)connect.
    fn on_open(&self) {}
    /// Called once per complete flushed event.
    fn on_message(&self, _event: &SseEvent) {}
    /// Called once per failed connection attempt or broken stream.
    fn on_error(&self, _error: &TransportError) {}
}

/// Receives decoded WebSocket frames.
pub trait MessageHandler: Send + Sync {
    fn on_text(&self, _text: &str) {}
    fn on_binary(&self, _data: &[u8]) {}
}
