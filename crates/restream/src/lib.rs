//! # restream
//!
//! Long-lived and repeating HTTP transport managers built on a plain
//! request/response primitive:
//!
//! - **SSE**: [`SseManager`] parses `text/event-stream` bodies and
//!   reconnects with attempt-aware backoff
//! - **Long polling**: [`PollingManager`] repeats a request until a
//!   sentinel header ends the stream
//! - **WebSocket**: [`WsClient`] owns a full-duplex connection with an
//!   explicit lifecycle state machine
//! - **Transfers**: [`DownloadManager`] / [`UploadManager`] stream files
//!   with sampled progress records
//!
//! All managers share one architecture: a background I/O producer feeds an
//! unbounded queue, a decoupled consumer drains it and dispatches each
//! item to an inline callback and an attached handler object
//! independently. Failures in user code are contained; a single
//! [`CancellationToken`](tokio_util::sync::CancellationToken) threads
//! through producer, consumer, and the awaited entry point.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use restream::{SseConfig, SseManager};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = SseManager::new(SseConfig::new("https://api.example.com/stream"))?
//!         .on_message(|event| {
//!             if let Some(data) = &event.data {
//!                 println!("event: {data}");
//!             }
//!         });
//!
//!     manager.run(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod polling;
pub mod queue;
pub mod retry;
pub mod sse;
pub mod transfer;
pub mod websocket;

pub use dispatch::{Callback, LifecycleCallback};
pub use error::{TransportError, TransportResult};
pub use handlers::{
    DataReceivedHandler, MessageHandler, ProgressHandler, SseHandler, TransferHandler,
};
pub use polling::{PollConfig, PollingManager};
pub use queue::{EventQueue, QueueReader, event_queue};
pub use retry::{BackoffConfig, RetryState, calculate_backoff};
pub use sse::{SseConfig, SseEvent, SseManager};
pub use transfer::{
    DownloadManager, IfExists, ProgressGate, ProgressRecord, TransferConfig, UploadManager,
};
pub use websocket::{ConnectionState, WsClient, WsConfig, WsEvent};
