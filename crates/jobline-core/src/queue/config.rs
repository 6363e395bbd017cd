//! Queue configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smallest accepted retention window.
pub const MIN_RETENTION_MS: u64 = 500;

/// Queue configuration. Immutable once the queue is built.
///
/// Missing fields take their defaults when deserialized, so `{}` is a valid
/// config (sequential, no dedup, no limits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Reject ids that are queued, running or still retained.
    pub unique_job_id: bool,

    /// Max jobs executing at the same time.
    pub max_concurrency: usize,

    /// Minimum spacing between dispatches, expressed as a rate.
    pub rate_limit_per_second: Option<f64>,

    /// How long a completed id keeps blocking resubmission.
    pub retention_ms: Option<u64>,

    /// Backpressure ceiling on pending jobs.
    pub max_queue_length: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            unique_job_id: false,
            max_concurrency: 1,
            rate_limit_per_second: None,
            retention_ms: None,
            max_queue_length: None,
        }
    }
}

impl QueueConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: QueueConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every constraint, returning the first one violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency < 1 {
            return Err(ConfigError::MaxConcurrency(self.max_concurrency));
        }
        if let Some(rate) = self.rate_limit_per_second
            && !(rate.is_finite() && rate > 0.0)
        {
            return Err(ConfigError::RateLimit(rate));
        }
        if let Some(ms) = self.retention_ms
            && ms < MIN_RETENTION_MS
        {
            return Err(ConfigError::RetentionTooShort {
                min: MIN_RETENTION_MS,
                got: ms,
            });
        }
        if let Some(max) = self.max_queue_length
            && max < 1
        {
            return Err(ConfigError::MaxQueueLength(max));
        }
        Ok(())
    }

    /// `round(1000 / rate)` milliseconds, or `None` when dispatch is unthrottled.
    pub fn dispatch_interval(&self) -> Option<Duration> {
        let rate = self.rate_limit_per_second?;
        let ms = (1000.0 / rate).round();
        if ms < 1.0 {
            return None;
        }
        Some(Duration::from_millis(ms as u64))
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention_ms.map(Duration::from_millis)
    }

    /// Completed ids are only remembered when dedup is on and a window is set.
    pub(crate) fn tracks_completions(&self) -> bool {
        self.unique_job_id && self.retention_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_sequential_without_limits() {
        let config = QueueConfig::default();
        assert!(!config.unique_job_id);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.dispatch_interval(), None);
        assert_eq!(config.retention(), None);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::zero_concurrency(QueueConfig { max_concurrency: 0, ..Default::default() })]
    #[case::zero_rate(QueueConfig { rate_limit_per_second: Some(0.0), ..Default::default() })]
    #[case::negative_rate(QueueConfig { rate_limit_per_second: Some(-2.0), ..Default::default() })]
    #[case::nan_rate(QueueConfig { rate_limit_per_second: Some(f64::NAN), ..Default::default() })]
    #[case::short_retention(QueueConfig { retention_ms: Some(499), ..Default::default() })]
    #[case::zero_queue_length(QueueConfig { max_queue_length: Some(0), ..Default::default() })]
    fn invalid_configs_are_rejected(#[case] config: QueueConfig) {
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case::min_retention(QueueConfig { retention_ms: Some(500), ..Default::default() })]
    #[case::fractional_rate(QueueConfig { rate_limit_per_second: Some(0.5), ..Default::default() })]
    #[case::all_set(QueueConfig {
        unique_job_id: true,
        max_concurrency: 8,
        rate_limit_per_second: Some(20.0),
        retention_ms: Some(60_000),
        max_queue_length: Some(1),
    })]
    fn valid_configs_pass(#[case] config: QueueConfig) {
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(1.0, 1000)]
    #[case(3.0, 333)]
    #[case(0.5, 2000)]
    #[case(6.0, 167)]
    fn dispatch_interval_is_rounded(#[case] rate: f64, #[case] ms: u64) {
        let config = QueueConfig {
            rate_limit_per_second: Some(rate),
            ..Default::default()
        };
        assert_eq!(config.dispatch_interval(), Some(Duration::from_millis(ms)));
    }

    #[test]
    fn very_high_rate_is_unthrottled() {
        let config = QueueConfig {
            rate_limit_per_second: Some(5000.0),
            ..Default::default()
        };
        assert_eq!(config.dispatch_interval(), None);
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = QueueConfig::from_json_str(r#"{"unique_job_id": true, "retention_ms": 1000}"#)
            .unwrap();
        assert!(config.unique_job_id);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.retention(), Some(Duration::from_millis(1000)));
        assert!(config.tracks_completions());
    }

    #[test]
    fn from_json_validates() {
        let err = QueueConfig::from_json_str(r#"{"max_concurrency": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MaxConcurrency(0)));

        let err = QueueConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
