//! Retry accounting and backoff calculation shared by the stream managers.

use std::time::Duration;

use rand::Rng;

/// Consecutive-failure counter carried by every reconnecting manager.
///
/// The counter is incremented only on a defined failure condition, never on
/// success, and is reset to zero only on an explicit successful
/// (re)connect.
#[derive(Clone, Copy, Debug)]
pub struct RetryState {
    current: u32,
    max: u32,
}

impl RetryState {
    /// Create a counter that allows `max` consecutive failures.
    pub fn new(max: u32) -> Self {
        Self { current: 0, max }
    }

    /// Number of consecutive failures recorded so far.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Configured maximum.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Record one failure and return the new count.
    pub fn record_failure(&mut self) -> u32 {
        self.current = self.current.saturating_add(1);
        self.current
    }

    /// Returns `true` once the failure budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.current >= self.max
    }

    /// Reset after a successful (re)connect.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

/// Shared reconnect/backoff configuration used by stream transports.
#[derive(Clone, Copy, Debug)]
pub struct BackoffConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    pub jitter: f64,
}

impl BackoffConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_delay.is_zero() {
            return Err("Initial retry delay must be > 0".to_string());
        }
        if self.max_delay.is_zero() {
            return Err("Max retry delay must be > 0".to_string());
        }
        if self.max_delay < self.initial_delay {
            return Err("Max retry delay must be >= initial retry delay".to_string());
        }
        if self.factor < 1.0 || !self.factor.is_finite() {
            return Err("Backoff factor must be >= 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.jitter) || !self.jitter.is_finite() {
            return Err("Jitter must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }
}

/// Compute the delay before retry attempt number `attempt` (zero-based).
pub fn calculate_backoff(config: BackoffConfig, attempt: u32) -> Duration {
    let initial = config.initial_delay.as_secs_f64();
    let max = config.max_delay.as_secs_f64();
    let exponent = config.factor.powf(f64::from(attempt));
    let base = (initial * exponent).min(max);

    if config.jitter == 0.0 {
        return Duration::from_secs_f64(base);
    }

    let mut rng = rand::rng();
    let randomized = rng.random_range(0.0..=base);
    let blended = base * (1.0 - config.jitter) + randomized * config.jitter;
    Duration::from_secs_f64(blended)
}
