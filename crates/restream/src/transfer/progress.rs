//! Progress sampling for file transfers.

use std::time::{Duration, Instant};

/// One sampled progress observation.
///
/// `total_size` is `-1` when the total is unknown (e.g. a download without
/// a `Content-Length` header).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressRecord {
    /// File or entity identity (usually the file name).
    pub name: String,
    /// Declared total size in bytes, or `-1` when unknown.
    pub total_size: i64,
    /// Bytes transferred so far.
    pub transferred: u64,
    /// Time elapsed since the transfer started.
    pub elapsed: Duration,
}

impl ProgressRecord {
    /// Completion ratio in `0.0..=1.0`, or `None` when the total is
    /// unknown or zero.
    pub fn ratio(&self) -> Option<f64> {
        if self.total_size > 0 {
            #[allow(clippy::cast_precision_loss)]
            Some((self.transferred as f64 / self.total_size as f64).min(1.0))
        } else {
            None
        }
    }
}

/// Decides, per transferred chunk, whether to emit a progress record.
///
/// Emission rules: always on the first chunk, always on the chunk that
/// completes a known total (even when it is also the first), otherwise no
/// more often than once per sampling interval. The interval is a
/// "no more often than" guarantee, not a hard-real-time timer.
#[derive(Debug)]
pub struct ProgressGate {
    name: String,
    total_size: i64,
    interval: Duration,
    transferred: u64,
    started: Instant,
    last_emit: Option<Instant>,
}

impl ProgressGate {
    /// Create a gate for one transfer. Pass `-1` as `total_size` when the
    /// total is unknown.
    pub fn new(name: impl Into<String>, total_size: i64, interval: Duration) -> Self {
        Self {
            name: name.into(),
            total_size,
            interval,
            transferred: 0,
            started: Instant::now(),
            last_emit: None,
        }
    }

    /// Bytes accumulated so far.
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    /// Account one chunk; returns a record when this chunk should be
    /// sampled.
    pub fn record_chunk(&mut self, len: usize) -> Option<ProgressRecord> {
        self.transferred += len as u64;
        let now = Instant::now();

        let first = self.last_emit.is_none();
        let completes = self.total_size >= 0 && self.transferred >= self.total_size as u64;
        let due = self
            .last_emit
            .is_some_and(|last| now.duration_since(last) >= self.interval);

        if !(first || completes || due) {
            return None;
        }

        self.last_emit = Some(now);
        Some(ProgressRecord {
            name: self.name.clone(),
            total_size: self.total_size,
            transferred: self.transferred,
            elapsed: now.duration_since(self.started),
        })
    }
}
