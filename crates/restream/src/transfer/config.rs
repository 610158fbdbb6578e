//! File-transfer configuration.

use std::{path::PathBuf, time::Duration};

/// What to do when a download destination already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IfExists {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Fail the transfer with an error.
    Error,
    /// Skip the transfer and return successfully.
    Skip,
}

/// Configuration for [`DownloadManager`](super::DownloadManager) and
/// [`UploadManager`](super::UploadManager).
#[derive(Clone, Debug)]
pub struct TransferConfig {
    /// Remote endpoint URL.
    pub url: String,
    /// Local file path: destination for downloads, source for uploads.
    pub path: PathBuf,
    /// Existence behaviour for download destinations.
    pub if_exists: IfExists,
    /// Minimum interval between progress samples.
    pub sample_interval: Duration,
    /// HTTP method override. Defaults to GET for downloads and POST for
    /// uploads when unset.
    pub method: Option<http::Method>,
    /// Additional HTTP headers.
    pub headers: http::HeaderMap,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            path: PathBuf::new(),
            if_exists: IfExists::default(),
            sample_interval: Duration::from_millis(500),
            method: None,
            headers: http::HeaderMap::new(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransferConfig {
    /// Create a new configuration with the given URL and local path.
    #[must_use]
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the existence behaviour for download destinations.
    #[must_use]
    pub fn if_exists(mut self, behaviour: IfExists) -> Self {
        self.if_exists = behaviour;
        self
    }

    /// Set the progress sampling interval.
    #[must_use]
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Override the HTTP method.
    #[must_use]
    pub fn method(mut self, method: http::Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set additional HTTP headers.
    #[must_use]
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The file name used as the transfer's identity in progress records.
    pub(crate) fn entity_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
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
        if self.path.as_os_str().is_empty() {
            return Err("Local path cannot be empty".to_string());
        }
        if self.sample_interval.is_zero() {
            return Err("Sample interval must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransferConfig::default();
        assert!(config.url.is_empty());
        assert_eq!(config.if_exists, IfExists::Overwrite);
        assert_eq!(config.sample_interval, Duration::from_millis(500));
        assert!(config.method.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = TransferConfig::new("https://example.com/file.bin", "/tmp/file.bin")
            .if_exists(IfExists::Skip)
            .sample_interval(Duration::from_millis(100))
            .method(http::Method::PUT)
            .connect_timeout(Duration::from_secs(5));

        assert_eq!(config.url, "https://example.com/file.bin");
        assert_eq!(config.path, PathBuf::from("/tmp/file.bin"));
        assert_eq!(config.if_exists, IfExists::Skip);
        assert_eq!(config.sample_interval, Duration::from_millis(100));
        assert_eq!(config.method, Some(http::Method::PUT));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_entity_name_is_file_name() {
        let config = TransferConfig::new("https://example.com", "/tmp/dir/file.bin");
        assert_eq!(config.entity_name(), "file.bin");
    }

    #[test]
    fn test_validation() {
        assert!(TransferConfig::default().validate().is_err());
        assert!(
            TransferConfig::new("https://example.com", "")
                .validate()
                .is_err()
        );
        assert!(
            TransferConfig::new("https://example.com", "/tmp/f")
                .sample_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            TransferConfig::new("https://example.com", "/tmp/f")
                .validate()
                .is_ok()
        );
    }
}
