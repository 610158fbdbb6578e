//! SSE connection driver.

use std::{sync::Arc, time::Duration};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{config::SseConfig, parser, parser::LineBuffer, record::SseEvent};
use crate::{
    dispatch::{Callback, LifecycleCallback, contain},
    error::{TransportError, TransportResult},
    handlers::SseHandler,
    queue::{EventQueue, event_queue},
    retry::{RetryState, calculate_backoff},
};

/// Server-Sent-Events manager.
///
/// Opens one streaming request, incrementally parses the
/// `text/event-stream` body into [`SseEvent`] records, and reconnects on
/// stream termination with attempt-aware backoff. Complete records flow
/// through an internal queue to a dispatch task, so parsing never blocks
/// on user callbacks.
///
/// Retries are counted consecutively: a successful (re)connect resets the
/// counter. When the retry budget is exhausted before the stream ever
/// opened, [`run`](Self::run) returns the underlying error; after at least
/// one successful open it stops cleanly instead.
pub struct SseManager {
    config: Arc<SseConfig>,
    on_open: Option<LifecycleCallback>,
    on_message: Option<Callback<SseEvent>>,
    on_error: Option<Callback<TransportError>>,
    handler: Option<Arc<dyn SseHandler>>,
}

impl SseManager {
    /// Create a manager from a validated configuration.
    pub fn new(config: SseConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::config)?;
        Ok(Self {
            config: Arc::new(config),
            on_open: None,
            on_message: None,
            on_error: None,
            handler: None,
        })
    }

    /// Set the inline callback fired once per successful (re)connect.
    #[must_use]
    pub fn on_open(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(callback));
        self
    }

    /// Set the inline callback fired once per complete event.
    #[must_use]
    pub fn on_message(mut self, callback: impl Fn(&SseEvent) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(callback));
        self
    }

    /// Set the inline callback fired once per failed attempt or broken
    /// stream.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&TransportError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Attach a handler object. Fired independently of the inline
    /// callbacks.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn SseHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Run the manager until the stream ends, retries are exhausted, or
    /// the token is cancelled.
    ///
    /// Occupies the caller for the lifetime of the session. On
    /// cancellation the queue is completed, buffered events are still
    /// dispatched, and `Err(TransportError::Cancelled)` is returned.
    pub async fn run(self, cancel: CancellationToken) -> TransportResult<()> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .build()?;

        let (queue, mut reader) = event_queue::<SseEvent>();

        let on_message = self.on_message.clone();
        let handler = self.handler.clone();
        let consumer = tokio::spawn(async move {
            while let Some(event) = reader.recv().await {
                if let Some(cb) = &on_message {
                    contain("on_message", || cb(&event));
                }
                if let Some(h) = &handler {
                    contain("handler.on_message", || h.on_message(&event));
                }
            }
        });

        let result = self.produce(&client, &queue, &cancel).await;

        // Let the dispatch task drain whatever the producer buffered.
        queue.complete();
        let _ = consumer.await;
        result
    }

    /// Non-blocking variant of [`run`](Self::run).
    pub fn spawn(
        self,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<TransportResult<()>> {
        tokio::spawn(self.run(cancel))
    }

    async fn produce(
        &self,
        client: &reqwest::Client,
        queue: &EventQueue<SseEvent>,
        cancel: &CancellationToken,
    ) -> TransportResult<()> {
        let mut retries = RetryState::new(self.config.max_retries);
        let mut retry_interval = self.config.retry_interval;
        let mut last_event_id: Option<String> = None;
        let mut ever_opened = false;

        loop {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }

            let error = match self
                .open_stream(client, last_event_id.as_deref(), cancel)
                .await
            {
                Ok(response) => {
                    ever_opened = true;
                    retries.reset();
                    self.fire_open();
                    match self
                        .read_stream(
                            response,
                            queue,
                            &mut retry_interval,
                            &mut last_event_id,
                            cancel,
                        )
                        .await
                    {
                        Ok(()) => None,
                        Err(e) => Some(e),
                    }
                }
                Err(e) => Some(e),
            };

            if let Some(error) = &error {
                if error.is_cancelled() {
                    return Err(TransportError::Cancelled);
                }
                self.fire_error(error);
            }

            let attempt = retries.record_failure();
            if retries.is_exhausted() {
                if ever_opened {
                    info!(url = %self.config.url, "SSE retries exhausted after open, stopping");
                    return Ok(());
                }
                return Err(error.unwrap_or_else(|| {
                    TransportError::protocol("SSE stream never opened")
                }));
            }

            let delay = calculate_backoff(
                self.config.backoff(retry_interval),
                attempt.saturating_sub(1),
            );
            debug!(url = %self.config.url, attempt, ?delay, "SSE reconnecting after delay");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn open_stream(
        &self,
        client: &reqwest::Client,
        last_event_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> TransportResult<reqwest::Response> {
        let mut request = client
            .request(self.config.method.clone(), &self.config.url)
            .headers(self.config.headers.clone())
            .header(http::header::ACCEPT, "text/event-stream");
        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }
        if let Some(body) = &self.config.body {
            request = request.body(body.clone());
        }

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
        Ok(response)
    }

    async fn read_stream(
        &self,
        response: reqwest::Response,
        queue: &EventQueue<SseEvent>,
        retry_interval: &mut Duration,
        last_event_id: &mut Option<String>,
        cancel: &CancellationToken,
    ) -> TransportResult<()> {
        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::new();
        let mut current: Option<SseEvent> = None;

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                chunk = stream.next() => chunk,
            };
            let chunk = match chunk {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            };

            for line in lines.push_chunk(&chunk) {
                if line.is_empty() {
                    Self::flush(&mut current, queue, retry_interval, last_event_id);
                } else {
                    parser::apply_line(&line, &mut current, self.config.retry_interval);
                }
            }
        }
    }

    /// Flush the in-progress record at a blank separator line.
    ///
    /// `retry:` and `id:` fields take effect even when the record is
    /// dropped as incomplete; only complete records reach the queue.
    fn flush(
        current: &mut Option<SseEvent>,
        queue: &EventQueue<SseEvent>,
        retry_interval: &mut Duration,
        last_event_id: &mut Option<String>,
    ) {
        let Some(record) = current.take() else {
            return;
        };
        if let Some(retry) = record.retry {
            *retry_interval = retry;
        }
        if let Some(id) = &record.id {
            *last_event_id = Some(id.clone());
        }
        if record.is_complete() {
            queue.push(record);
        } else {
            debug!("dropping incomplete SSE record at separator");
        }
    }

    fn fire_open(&self) {
        info!(url = %self.config.url, "SSE stream opened");
        if let Some(cb) = &self.on_open {
            contain("on_open", || cb());
        }
        if let Some(h) = &self.handler {
            contain("handler.on_open", || h.on_open());
        }
    }

    fn fire_error(&self, error: &TransportError) {
        warn!(url = %self.config.url, %error, "SSE stream attempt failed");
        if let Some(cb) = &self.on_error {
            contain("on_error", || cb(error));
        }
        if let Some(h) = &self.handler {
            contain("handler.on_error", || h.on_error(error));
        }
    }
}
