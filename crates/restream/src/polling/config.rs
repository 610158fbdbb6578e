//! Long-polling configuration.

use std::time::Duration;

/// Default sentinel header name signalling "no more data will arrive".
pub const DEFAULT_END_OF_STREAM_HEADER: &str = "x-end-of-stream";

/// Configuration for a [`PollingManager`](super::PollingManager).
#[derive(Clone, Debug)]
pub struct PollConfig {
    /// Polling endpoint URL.
    pub url: String,
    /// HTTP method.
    pub method: http::Method,
    /// Additional HTTP headers to include with every request.
    pub headers: http::HeaderMap,
    /// Optional request body sent with every poll.
    pub body: Option<Vec<u8>>,
    /// Delay before retrying after a transport-level failure.
    pub poll_interval: Duration,
    /// Consecutive-failure budget before the loop gives up silently.
    pub max_retries: u32,
    /// Response header whose presence-and-truthiness terminates the loop.
    pub end_of_stream_header: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: http::Method::GET,
            headers: http::HeaderMap::new(),
            body: None,
            poll_interval: Duration::from_secs(1),
            max_retries: 5,
            end_of_stream_header: DEFAULT_END_OF_STREAM_HEADER.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl PollConfig {
    /// Create a new configuration with the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the HTTP method.
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

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the failure retry delay.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the consecutive-failure budget.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the termination sentinel header name.
    #[must_use]
    pub fn end_of_stream_header(mut self, name: impl Into<String>) -> Self {
        self.end_of_stream_header = name.into();
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
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
        if self.poll_interval.is_zero() {
            return Err("Poll interval must be > 0".to_string());
        }
        if self.end_of_stream_header.is_empty() {
            return Err("End-of-stream header name cannot be empty".to_string());
        }
        if http::HeaderName::try_from(self.end_of_stream_header.as_str()).is_err() {
            return Err("End-of-stream header name is not a valid header name".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert!(config.url.is_empty());
        assert_eq!(config.method, http::Method::GET);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.end_of_stream_header, DEFAULT_END_OF_STREAM_HEADER);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PollConfig::new("https://api.example.com/poll")
            .method(http::Method::POST)
            .body(b"cursor=0".to_vec())
            .poll_interval(Duration::from_millis(250))
            .max_retries(3)
            .end_of_stream_header("x-done")
            .connect_timeout(Duration::from_secs(5));

        assert_eq!(config.url, "https://api.example.com/poll");
        assert_eq!(config.method, http::Method::POST);
        assert_eq!(config.body.as_deref(), Some(b"cursor=0".as_slice()));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.end_of_stream_header, "x-done");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validation_empty_url() {
        assert!(PollConfig::default().validate().is_err());
    }

    #[test]
    fn test_validation_zero_interval() {
        let config = PollConfig::new("https://example.com").poll_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_header_name() {
        let config = PollConfig::new("https://example.com").end_of_stream_header("not valid");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(PollConfig::new("https://example.com").validate().is_ok());
    }
}
