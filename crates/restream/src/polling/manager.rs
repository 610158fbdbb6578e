//! Long-polling loop driver.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::PollConfig;
use crate::{
    dispatch::{Callback, contain},
    error::{TransportError, TransportResult},
    handlers::DataReceivedHandler,
    queue::event_queue,
    retry::RetryState,
};

/// Outcome of a single polling cycle.
#[derive(Debug)]
enum PollOutcome {
    /// Sentinel header was present and truthy; stop polling.
    EndOfStream,
    /// Successful response body to dispatch.
    Data(String),
    /// 5xx response; counts against the retry budget, never terminal by
    /// itself.
    ServerError(http::StatusCode),
    /// Any other non-success status; logged and ignored.
    Ignored(http::StatusCode),
}

/// Long-polling manager.
///
/// Repeats a request until a response carries the configured end-of-stream
/// sentinel header. Successful bodies are dispatched through the data
/// callback and handler; only consecutive failures are counted against the
/// retry budget, and the counter is never reset.
///
/// Polling is best-effort: exhausting the retry budget on transport
/// failures stops the loop silently rather than surfacing an error. This
/// is deliberately asymmetric with the WebSocket client, where a connect
/// failure after exhausted retries is a hard error.
pub struct PollingManager {
    config: Arc<PollConfig>,
    on_data: Option<Callback<String>>,
    handler: Option<Arc<dyn DataReceivedHandler>>,
}

impl PollingManager {
    /// Create a manager from a validated configuration.
    pub fn new(config: PollConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::config)?;
        Ok(Self {
            config: Arc::new(config),
            on_data: None,
            handler: None,
        })
    }

    /// Set the inline callback fired once per successful response body.
    #[must_use]
    pub fn on_data(mut self, callback: impl Fn(&String) + Send + Sync + 'static) -> Self {
        self.on_data = Some(Arc::new(callback));
        self
    }

    /// Attach a handler object. Fired independently of the inline
    /// callback.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn DataReceivedHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Run the polling loop until termination, give-up, or cancellation.
    pub async fn run(self, cancel: CancellationToken) -> TransportResult<()> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .build()?;

        let (queue, mut reader) = event_queue::<String>();

        let on_data = self.on_data.clone();
        let handler = self.handler.clone();
        let consumer = tokio::spawn(async move {
            while let Some(body) = reader.recv().await {
                if let Some(cb) = &on_data {
                    contain("on_data", || cb(&body));
                }
                if let Some(h) = &handler {
                    contain("handler.on_data", || h.on_data(&body));
                }
            }
        });

        let mut retries = RetryState::new(self.config.max_retries);
        let result = loop {
            if cancel.is_cancelled() {
                break Err(TransportError::Cancelled);
            }

            match self.poll_once(&client, &cancel).await {
                Ok(PollOutcome::EndOfStream) => {
                    info!(url = %self.config.url, "end-of-stream sentinel received, stopping");
                    break Ok(());
                }
                Ok(PollOutcome::Data(body)) => {
                    queue.push(body);
                }
                Ok(PollOutcome::ServerError(status)) => {
                    // Counts against the budget but never terminates on
                    // its own; only the transport-failure path gives up.
                    let attempt = retries.record_failure();
                    warn!(url = %self.config.url, %status, attempt, "server failure while polling");
                }
                Ok(PollOutcome::Ignored(status)) => {
                    debug!(url = %self.config.url, %status, "ignoring non-success polling response");
                }
                Err(TransportError::Cancelled) => break Err(TransportError::Cancelled),
                Err(error) => {
                    let attempt = retries.record_failure();
                    warn!(url = %self.config.url, %error, attempt, "transport failure while polling");
                    if retries.is_exhausted() {
                        // Best-effort: give up without surfacing an error.
                        warn!(url = %self.config.url, "polling retries exhausted, giving up");
                        break Ok(());
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break Err(TransportError::Cancelled),
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        };

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

    async fn poll_once(
        &self,
        client: &reqwest::Client,
        cancel: &CancellationToken,
    ) -> TransportResult<PollOutcome> {
        let mut request = client
            .request(self.config.method.clone(), &self.config.url)
            .headers(self.config.headers.clone());
        if let Some(body) = &self.config.body {
            request = request.body(body.clone());
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = request.send() => result?,
        };

        // The sentinel terminates regardless of status code and without
        // dispatching the body.
        let sentinel = response
            .headers()
            .get(self.config.end_of_stream_header.as_str())
            .and_then(|value| value.to_str().ok())
            .is_some_and(is_truthy);
        if sentinel {
            return Ok(PollOutcome::EndOfStream);
        }

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            Ok(PollOutcome::Data(body))
        } else if status.is_server_error() {
            Ok(PollOutcome::ServerError(status))
        } else {
            Ok(PollOutcome::Ignored(status))
        }
    }
}

/// Sentinel truthiness: `1`, `true`, or `yes`, case insensitive.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_config() {
        assert!(PollingManager::new(PollConfig::default()).is_err());
        assert!(PollingManager::new(PollConfig::new("https://example.com/poll")).is_ok());
    }

    #[test]
    fn sentinel_truthiness() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" Yes "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }
}
