//! Progress-tracked file transfer.
//!
//! The simplest instance of the producer/queue/consumer pattern: file I/O
//! drives a [`ProgressGate`] that samples transferred-byte counts, and the
//! sampled records are dispatched off the I/O path.

mod config;
mod download;
mod events;
mod progress;
mod upload;

pub use config::{IfExists, TransferConfig};
pub use download::DownloadManager;
pub use progress::{ProgressGate, ProgressRecord};
pub use upload::UploadManager;
