//! WebSocket client configuration.

use std::time::Duration;

/// Configuration for a [`WsClient`](super::WsClient).
#[derive(Clone, Debug)]
pub struct WsConfig {
    /// WebSocket server URL (`ws://` or `wss://`).
    pub url: String,
    /// Delay between reconnection attempts.
    pub reconnect_interval: Duration,
    /// Number of retries after the initial attempt before a connect fails
    /// hard.
    pub max_reconnect_retries: u32,
    /// Maximum size of a received message/frame in bytes.
    pub receive_buffer_size: usize,
    /// Overall connect timeout per attempt. Zero means no timeout.
    pub connect_timeout: Duration,
    /// Capacity of the observable-event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_interval: Duration::from_secs(5),
            max_reconnect_retries: 3,
            receive_buffer_size: 64 * 1024 * 1024,
            connect_timeout: Duration::from_secs(10),
            event_channel_capacity: 256,
        }
    }
}

impl WsConfig {
    /// Create a new configuration with the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the reconnection delay.
    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Set the reconnection retry budget.
    #[must_use]
    pub fn max_reconnect_retries(mut self, retries: u32) -> Self {
        self.max_reconnect_retries = retries;
        self
    }

    /// Set the maximum received message size.
    #[must_use]
    pub fn receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size;
        self
    }

    /// Set the per-attempt connect timeout. Zero disables the timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the observable-event channel capacity.
    #[must_use]
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
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
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err("URL must start with ws:// or wss://".to_string());
        }
        if self.receive_buffer_size == 0 {
            return Err("Receive buffer size must be > 0".to_string());
        }
        if self.event_channel_capacity == 0 {
            return Err("Event channel capacity must be > 0".to_string());
        }
        Ok(())
    }
}
