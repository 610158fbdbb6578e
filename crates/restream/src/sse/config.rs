//! SSE manager configuration.

use std::time::Duration;

use crate::retry::BackoffConfig;

/// Configuration for an [`SseManager`](super::SseManager).
///
/// Provides sensible defaults and chainable setter methods.
#[derive(Clone, Debug)]
pub struct SseConfig {
    /// SSE endpoint URL.
    pub url: String,
    /// HTTP method (usually GET, some APIs use POST).
    pub method: http::Method,
    /// Additional HTTP headers to include with every request.
    pub headers: http::HeaderMap,
    /// Optional request body (for POST-based SSE).
    pub body: Option<Vec<u8>>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Default delay before a reconnection attempt. A `retry:` field
    /// received on the stream overrides this for the rest of the session.
    pub retry_interval: Duration,
    /// Maximum number of consecutive failed attempts before giving up.
    pub max_retries: u32,
    /// Maximum delay between reconnection attempts.
    pub backoff_max_delay: Duration,
    /// Backoff multiplier for reconnection delays.
    pub backoff_factor: f64,
    /// Random jitter factor (0.0-1.0) for reconnection delays.
    pub backoff_jitter: f64,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: http::Method::GET,
            headers: http::HeaderMap::new(),
            body: None,
            connect_timeout: Duration::from_secs(10),
            retry_interval: Duration::from_secs(3),
            max_retries: 5,
            backoff_max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
            backoff_jitter: 0.1,
        }
    }
}

impl SseConfig {
    /// Create a new configuration with the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the HTTP method (e.g., `POST` for POST-based SSE).
    #[must_use]
    pub fn method(mut self, method: http::Method) -> Self {
        self.method = method;
        self
    }

    /// Set additional HTTP headers.
    #[must_use]
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the request body (for POST-based SSE).
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the default retry interval.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the maximum number of consecutive failed attempts.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the maximum reconnection delay.
    #[must_use]
    pub fn backoff_max_delay(mut self, delay: Duration) -> Self {
        self.backoff_max_delay = delay;
        self
    }

    /// Set the reconnection backoff factor.
    #[must_use]
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the reconnection jitter factor.
    #[must_use]
    pub fn backoff_jitter(mut self, jitter: f64) -> Self {
        self.backoff_jitter = jitter;
        self
    }

    /// The backoff parameters for a reconnect wait starting from `initial`.
    pub(crate) fn backoff(&self, initial: Duration) -> BackoffConfig {
        BackoffConfig {
            initial_delay: initial,
            max_delay: self.backoff_max_delay.max(initial),
            factor: self.backoff_factor,
            jitter: self.backoff_jitter,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error message string if any field has an invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("URL cannot be empty".to_string());
        }
        if self.retry_interval.is_zero() {
            return Err("Retry interval must be > 0".to_string());
        }
        self.backoff(self.retry_interval).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SseConfig::default();
        assert!(config.url.is_empty());
        assert_eq!(config.method, http::Method::GET);
        assert!(config.headers.is_empty());
        assert!(config.body.is_none());
        assert_eq!(config.retry_interval, Duration::from_secs(3));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff_factor, 2.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SseConfig::new("https://api.example.com/stream")
            .method(http::Method::POST)
            .body(b"subscribe".to_vec())
            .connect_timeout(Duration::from_secs(30))
            .retry_interval(Duration::from_millis(500))
            .max_retries(10)
            .backoff_max_delay(Duration::from_secs(120))
            .backoff_factor(1.5)
            .backoff_jitter(0.2);

        assert_eq!(config.url, "https://api.example.com/stream");
        assert_eq!(config.method, http::Method::POST);
        assert_eq!(config.body.as_deref(), Some(b"subscribe".as_slice()));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.retry_interval, Duration::from_millis(500));
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.backoff_max_delay, Duration::from_secs(120));
        assert_eq!(config.backoff_factor, 1.5);
        assert_eq!(config.backoff_jitter, 0.2);
    }

    #[test]
    fn test_validation_empty_url() {
        let result = SseConfig::default().validate();
        assert_eq!(result.expect_err("should fail"), "URL cannot be empty");
    }

    #[test]
    fn test_validation_invalid_backoff() {
        let config = SseConfig::new("https://example.com").backoff_factor(0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_jitter() {
        let config = SseConfig::new("https://example.com").backoff_jitter(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(SseConfig::new("https://example.com").validate().is_ok());
    }
}
