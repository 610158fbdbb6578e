//! Streaming upload with sampled progress.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    config::TransferConfig,
    events::TransferEvents,
    progress::{ProgressGate, ProgressRecord},
};
use crate::{
    error::{TransportError, TransportResult},
    handlers::{ProgressHandler, TransferHandler},
    queue::{EventQueue, event_queue},
};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Progress-tracked file upload.
///
/// Streams a local file as the request body, sampling progress per read
/// through the same emission gate as downloads. Records are queued off the
/// I/O path and dispatched from a separate task.
pub struct UploadManager {
    config: Arc<TransferConfig>,
    events: TransferEvents,
}

impl UploadManager {
    /// Create a manager from a validated configuration.
    pub fn new(config: TransferConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::config)?;
        Ok(Self {
            config: Arc::new(config),
            events: TransferEvents::default(),
        })
    }

    /// Set the inline callback fired when the transfer starts.
    #[must_use]
    pub fn on_started(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.events.on_started = Some(Arc::new(callback));
        self
    }

    /// Set the inline callback fired when the transfer completes.
    #[must_use]
    pub fn on_completed(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.events.on_completed = Some(Arc::new(callback));
        self
    }

    /// Set the inline callback fired when the transfer fails.
    #[must_use]
    pub fn on_failed(mut self, callback: impl Fn(&TransportError) + Send + Sync + 'static) -> Self {
        self.events.on_failed = Some(Arc::new(callback));
        self
    }

    /// Set the inline callback fired once per sampled progress record.
    #[must_use]
    pub fn on_progress(
        mut self,
        callback: impl Fn(&ProgressRecord) + Send + Sync + 'static,
    ) -> Self {
        self.events.on_progress = Some(Arc::new(callback));
        self
    }

    /// Attach a progress handler object.
    #[must_use]
    pub fn progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.events.progress_handler = Some(handler);
        self
    }

    /// Attach a transfer lifecycle handler object.
    #[must_use]
    pub fn transfer_handler(mut self, handler: Arc<dyn TransferHandler>) -> Self {
        self.events.transfer_handler = Some(handler);
        self
    }

    /// Run the upload to completion or cancellation.
    pub async fn run(self, cancel: CancellationToken) -> TransportResult<()> {
        let (queue, mut reader) = event_queue::<ProgressRecord>();
        let queue = Arc::new(queue);

        let events = self.events.clone();
        let consumer = tokio::spawn(async move {
            while let Some(record) = reader.recv().await {
                events.dispatch_progress(&record);
            }
        });

        let result = self.push(&queue, &cancel).await;

        queue.complete();
        let _ = consumer.await;

        match &result {
            Ok(()) => self.events.fire_completed(),
            Err(error) if error.is_cancelled() => {}
            Err(error) => self.events.fire_failed(error),
        }
        result
    }

    /// Non-blocking variant of [`run`](Self::run).
    pub fn spawn(
        self,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<TransportResult<()>> {
        tokio::spawn(self.run(cancel))
    }

    async fn push(
        &self,
        queue: &Arc<EventQueue<ProgressRecord>>,
        cancel: &CancellationToken,
    ) -> TransportResult<()> {
        let file = tokio::fs::File::open(&self.config.path).await?;
        let total_size = i64::try_from(file.metadata().await?.len()).unwrap_or(-1);

        self.events.fire_started();

        let gate = ProgressGate::new(
            self.config.entity_name(),
            total_size,
            self.config.sample_interval,
        );

        // Progress is sampled inside the body stream, per read, so it
        // tracks what the HTTP client actually consumed.
        let body_queue = Arc::clone(queue);
        let body_stream = futures_util::stream::try_unfold(
            (file, gate, body_queue),
            |(mut file, mut gate, queue)| async move {
                let mut buf = vec![0u8; READ_CHUNK_SIZE];
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    return Ok::<_, std::io::Error>(None);
                }
                buf.truncate(n);
                if let Some(record) = gate.record_chunk(n) {
                    queue.push(record);
                }
                Ok(Some((Bytes::from(buf), (file, gate, queue))))
            },
        );

        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .build()?;
        let method = self
            .config
            .method
            .clone()
            .unwrap_or(http::Method::POST);
        let request = client
            .request(method, &self.config.url)
            .headers(self.config.headers.clone())
            .body(reqwest::Body::wrap_stream(body_stream));

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = request.send() => result?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::api(status, body));
        }

        debug!(path = %self.config.path.display(), "upload complete");
        Ok(())
    }
}
