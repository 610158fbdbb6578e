//! Dual-dispatch surface shared by the download and upload managers.

use std::sync::Arc;

use tracing::warn;

use super::progress::ProgressRecord;
use crate::{
    dispatch::{Callback, LifecycleCallback, contain},
    error::TransportError,
    handlers::{ProgressHandler, TransferHandler},
};

/// Callback and handler registrations for one transfer.
#[derive(Clone, Default)]
pub(crate) struct TransferEvents {
    pub on_started: Option<LifecycleCallback>,
    pub on_completed: Option<LifecycleCallback>,
    pub on_failed: Option<Callback<TransportError>>,
    pub on_progress: Option<Callback<ProgressRecord>>,
    pub progress_handler: Option<Arc<dyn ProgressHandler>>,
    pub transfer_handler: Option<Arc<dyn TransferHandler>>,
}

impl TransferEvents {
    pub fn fire_started(&self) {
        if let Some(cb) = &self.on_started {
            contain("on_started", || cb());
        }
        if let Some(h) = &self.transfer_handler {
            contain("handler.on_started", || h.on_started());
        }
    }

    pub fn fire_completed(&self) {
        if let Some(cb) = &self.on_completed {
            contain("on_completed", || cb());
        }
        if let Some(h) = &self.transfer_handler {
            contain("handler.on_completed", || h.on_completed());
        }
    }

    pub fn fire_failed(&self, error: &TransportError) {
        warn!(%error, "transfer failed");
        if let Some(cb) = &self.on_failed {
            contain("on_failed", || cb(error));
        }
        if let Some(h) = &self.transfer_handler {
            contain("handler.on_failed", || h.on_failed(error));
        }
    }

    pub fn dispatch_progress(&self, record: &ProgressRecord) {
        if let Some(cb) = &self.on_progress {
            contain("on_progress", || cb(record));
        }
        if let Some(h) = &self.progress_handler {
            contain("handler.on_progress", || h.on_progress(record));
        }
    }
}
