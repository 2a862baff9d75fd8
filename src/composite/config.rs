//! Configuration for composite views.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How reopen decides that a newly enumerated segment is one it already knows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentReusePolicy {
    /// Same name means same content. Deletes are inherited even if the store
    /// rewrote the segment in place.
    #[default]
    ByName,
    /// Same name and same content token. A token mismatch, or a segment
    /// without a token, is opened as a brand-new snapshot.
    ByNameAndVersion,
}

/// Configuration for [`CompositeView`](crate::composite::view::CompositeView).
///
/// # Example
///
/// ```
/// use tessera::composite::config::{CompositeViewConfig, SegmentReusePolicy};
///
/// let config = CompositeViewConfig::builder()
///     .slow_reopen_threshold_ms(250)
///     .reuse_policy(SegmentReusePolicy::ByNameAndVersion)
///     .build();
/// assert_eq!(config.slow_reopen_threshold_ms, 250);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeViewConfig {
    /// Reopens slower than this are logged at info level instead of debug.
    pub slow_reopen_threshold_ms: u64,

    /// Segment identity used when reusing snapshots across reopen.
    pub reuse_policy: SegmentReusePolicy,

    /// Check that segment doc counts add up to the store's reported total.
    pub validate_doc_counts: bool,
}

impl Default for CompositeViewConfig {
    fn default() -> Self {
        CompositeViewConfig {
            slow_reopen_threshold_ms: 1000,
            reuse_policy: SegmentReusePolicy::ByName,
            validate_doc_counts: true,
        }
    }
}

impl CompositeViewConfig {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> CompositeViewConfigBuilder {
        CompositeViewConfigBuilder::default()
    }

    /// Parse from JSON. Missing fields take their default.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn slow_reopen_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_reopen_threshold_ms)
    }
}

/// Builder for [`CompositeViewConfig`].
#[derive(Debug, Clone, Default)]
pub struct CompositeViewConfigBuilder {
    config: CompositeViewConfig,
}

impl CompositeViewConfigBuilder {
    pub fn slow_reopen_threshold_ms(mut self, millis: u64) -> Self {
        self.config.slow_reopen_threshold_ms = millis;
        self
    }

    pub fn reuse_policy(mut self, policy: SegmentReusePolicy) -> Self {
        self.config.reuse_policy = policy;
        self
    }

    pub fn validate_doc_counts(mut self, validate: bool) -> Self {
        self.config.validate_doc_counts = validate;
        self
    }

    pub fn build(self) -> CompositeViewConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CompositeViewConfig::default();
        assert_eq!(config.slow_reopen_threshold(), Duration::from_secs(1));
        assert_eq!(config.reuse_policy, SegmentReusePolicy::ByName);
        assert!(config.validate_doc_counts);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            CompositeViewConfig::from_json_str(r#"{"reuse_policy": "by_name_and_version"}"#)
                .unwrap();
        assert_eq!(config.reuse_policy, SegmentReusePolicy::ByNameAndVersion);
        assert_eq!(config.slow_reopen_threshold_ms, 1000);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = CompositeViewConfig::from_json_str(r#"{"reuse_policy": "by_hash"}"#).unwrap_err();
        assert!(matches!(err, crate::error::TesseraError::Json(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"slow_reopen_threshold_ms": 5, "validate_doc_counts": false}}"#
        )
        .unwrap();

        let config = CompositeViewConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.slow_reopen_threshold_ms, 5);
        assert!(!config.validate_doc_counts);
    }
}
