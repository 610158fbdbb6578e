//! Streaming download with sampled progress.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    config::{IfExists, TransferConfig},
    events::TransferEvents,
    progress::{ProgressGate, ProgressRecord},
};
use crate::{
    error::{TransportError, TransportResult},
    handlers::{ProgressHandler, TransferHandler},
    queue::{EventQueue, event_queue},
};

/// Progress-tracked file download.
///
/// Streams a GET response body to a local file. Progress records are
/// sampled on the I/O path but pushed onto an internal queue and
/// dispatched from a separate task, so a slow progress consumer never
/// slows down file I/O.
pub struct DownloadManager {
    config: Arc<TransferConfig>,
    events: TransferEvents,
}

impl DownloadManager {
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

    /// Run the download to completion or cancellation.
    pub async fn run(self, cancel: CancellationToken) -> TransportResult<()> {
        if self.config.path.exists() {
            match self.config.if_exists {
                IfExists::Skip => {
                    info!(path = %self.config.path.display(), "destination exists, skipping download");
                    return Ok(());
                }
                IfExists::Error => {
                    let error = TransportError::Io(std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        format!("destination {} already exists", self.config.path.display()),
                    ));
                    self.events.fire_failed(&error);
                    return Err(error);
                }
                IfExists::Overwrite => {}
            }
        }

        self.events.fire_started();

        let (queue, mut reader) = event_queue::<ProgressRecord>();
        let events = self.events.clone();
        let consumer = tokio::spawn(async move {
            while let Some(record) = reader.recv().await {
                events.dispatch_progress(&record);
            }
        });

        let result = self.fetch(&queue, &cancel).await;

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

    async fn fetch(
        &self,
        queue: &EventQueue<ProgressRecord>,
        cancel: &CancellationToken,
    ) -> TransportResult<()> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .build()?;
        let method = self
            .config
            .method
            .clone()
            .unwrap_or(http::Method::GET);
        let request = client
            .request(method, &self.config.url)
            .headers(self.config.headers.clone());

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

        let total_size = response
            .content_length()
            .and_then(|len| i64::try_from(len).ok())
            .unwrap_or(-1);
        let mut gate = ProgressGate::new(
            self.config.entity_name(),
            total_size,
            self.config.sample_interval,
        );

        let mut file = tokio::fs::File::create(&self.config.path).await?;
        let mut stream = response.bytes_stream();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                chunk = stream.next() => chunk,
            };
            let chunk = match chunk {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Err(e.into()),
                None => break,
            };

            file.write_all(&chunk).await?;
            if let Some(record) = gate.record_chunk(chunk.len()) {
                queue.push(record);
            }
        }

        file.flush().await?;
        debug!(
            path = %self.config.path.display(),
            bytes = gate.transferred(),
            "download complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_config() {
        assert!(DownloadManager::new(TransferConfig::default()).is_err());
        assert!(
            DownloadManager::new(TransferConfig::new("https://example.com/f", "/tmp/f")).is_ok()
        );
    }
}
