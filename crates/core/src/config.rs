use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::sizing::{DEFAULT_SIZE_THRESHOLD, MAX_ATTRIBUTES};

/// Dispatcher settings as supplied by the caller.
///
/// Usually built in code with the `with_*` methods or loaded from the
/// `[dispatcher]` table of a TOML file:
///
/// ```toml
/// queue_url = "https://sqs.us-east-1.amazonaws.com/123456789012/orders"
/// bucket = "orders-payloads"
/// size_threshold = 262144
/// force_offload = false
/// key_prefix = "orders/"
/// ```
///
/// Nothing is checked until [`validate`](Self::validate) runs, which the
/// dispatcher does on construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Target queue for every send. Required.
    #[serde(default)]
    pub queue_url: Option<String>,
    /// Bucket for offloaded payloads. Required only if offload triggers.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Size in bytes above which a message is offloaded.
    #[serde(default)]
    pub size_threshold: Option<i64>,
    /// Offload every message regardless of size.
    #[serde(default)]
    pub force_offload: bool,
    /// Maximum number of attributes per message.
    #[serde(default)]
    pub max_attributes: Option<usize>,
    /// Prefix prepended to every generated object key.
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl DispatcherConfig {
    /// Create a config targeting `queue_url` with every other setting at its default.
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: Some(queue_url.into()),
            ..Self::default()
        }
    }

    /// Parse a config from a TOML document.
    ///
    /// Type mismatches (a numeric bucket, a textual threshold, ...) are
    /// reported as [`ConfigError::Parse`].
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    #[must_use]
    pub fn with_size_threshold(mut self, size_threshold: i64) -> Self {
        self.size_threshold = Some(size_threshold);
        self
    }

    #[must_use]
    pub fn with_force_offload(mut self, force_offload: bool) -> Self {
        self.force_offload = force_offload;
        self
    }

    #[must_use]
    pub fn with_max_attributes(mut self, max_attributes: usize) -> Self {
        self.max_attributes = Some(max_attributes);
        self
    }

    #[must_use]
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(key_prefix.into());
        self
    }

    /// Check the settings and fill in defaults.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let queue_url = self
            .queue_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingQueueUrl)?;

        if let Some(bucket) = &self.bucket
            && bucket.trim().is_empty()
        {
            return Err(ConfigError::InvalidBucket(bucket.clone()));
        }

        let size_threshold = match self.size_threshold {
            None => DEFAULT_SIZE_THRESHOLD,
            Some(value) => match u64::try_from(value) {
                Ok(threshold) if threshold > 0 => threshold,
                _ => return Err(ConfigError::InvalidSizeThreshold(value)),
            },
        };

        let max_attributes = match self.max_attributes {
            None => MAX_ATTRIBUTES,
            Some(0) => return Err(ConfigError::InvalidMaxAttributes),
            Some(max) => max,
        };

        if self.force_offload && self.bucket.is_none() {
            return Err(ConfigError::MissingBucket);
        }

        Ok(ValidatedConfig {
            queue_url,
            bucket: self.bucket,
            size_threshold,
            force_offload: self.force_offload,
            max_attributes,
            key_prefix: self.key_prefix,
        })
    }
}

/// Checked, immutable dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    queue_url: String,
    bucket: Option<String>,
    size_threshold: u64,
    force_offload: bool,
    max_attributes: usize,
    key_prefix: Option<String>,
}

impl ValidatedConfig {
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    pub fn size_threshold(&self) -> u64 {
        self.size_threshold
    }

    pub fn force_offload(&self) -> bool {
        self.force_offload
    }

    pub fn max_attributes(&self) -> usize {
        self.max_attributes
    }

    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }
}
