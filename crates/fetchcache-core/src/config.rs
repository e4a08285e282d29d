//! Orchestrator configuration
//!
//! Every option is optional. Files may be TOML or JSON, and keys are accepted
//! in either snake_case or the camelCase used by browser-side callers.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Interval of the background cache sweep when `auto_cleanup` is enabled
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Cache settings. Caching is disabled when this block is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Expiry window in milliseconds
    #[serde(alias = "maxAge")]
    pub max_age_ms: u64,

    /// Entry count that triggers eviction
    #[serde(alias = "maxSize")]
    pub max_size: usize,

    /// Sweep expired entries every [`CLEANUP_INTERVAL`]
    #[serde(alias = "autoCleanup")]
    pub auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 5 * 60 * 1000,
            max_size: 100,
            auto_cleanup: false,
        }
    }
}

impl CacheConfig {
    pub fn new(max_age: Duration, max_size: usize) -> Self {
        Self {
            max_age_ms: max_age.as_millis() as u64,
            max_size,
            auto_cleanup: false,
        }
    }

    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }
}

/// Retry policy for failed provider calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per fetch cycle
    #[serde(alias = "maxRetries")]
    pub max_retries: u32,

    /// Base delay before the second attempt, in milliseconds
    #[serde(alias = "retryDelay")]
    pub retry_delay_ms: u64,

    #[serde(alias = "backoffMultiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, retry_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_retries,
            retry_delay_ms: retry_delay.as_millis() as u64,
            backoff_multiplier,
        }
    }

    /// Delay to wait after `attempt` (1-based) has failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.retry_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(millis.round() as u64)
    }
}

/// Full orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    #[serde(alias = "cacheConfig")]
    pub cache: Option<CacheConfig>,

    /// Setting a retry policy also turns off cache reads (see `fetch_data`)
    #[serde(alias = "retryConfig")]
    pub retry: Option<RetryConfig>,

    #[serde(alias = "debounceDelay")]
    pub debounce_delay_ms: u64,

    #[serde(alias = "enableRealTimeUpdates")]
    pub enable_real_time_updates: bool,

    #[serde(alias = "updateInterval")]
    pub update_interval_ms: Option<u64>,

    #[serde(alias = "journalCapacity")]
    pub journal_capacity: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache: None,
            retry: None,
            debounce_delay_ms: 300,
            enable_real_time_updates: false,
            update_interval_ms: None,
            journal_capacity: 100,
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_real_time_updates(mut self, interval: Duration) -> Self {
        self.enable_real_time_updates = true;
        self.update_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Refresh interval, only when real-time updates are switched on
    pub fn update_interval(&self) -> Option<Duration> {
        if !self.enable_real_time_updates {
            return None;
        }
        self.update_interval_ms.map(Duration::from_millis)
    }

    /// Retry policy in effect: the configured one, else the defaults
    pub fn effective_retry(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    /// Load configuration from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let content = std::fs::read_to_string(path).map_err(|e| FetchError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config: Self = if is_json {
            serde_json::from_str(&content).map_err(|e| FetchError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| FetchError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        let invalid = |message: &str| {
            Err(FetchError::InvalidConfig {
                message: message.to_string(),
            })
        };

        if let Some(cache) = &self.cache {
            if cache.max_size == 0 {
                return invalid("cache.max_size must be greater than 0");
            }
        }

        if let Some(retry) = &self.retry {
            if retry.max_retries == 0 {
                return invalid("retry.max_retries must be at least 1");
            }
            if !retry.backoff_multiplier.is_finite() || retry.backoff_multiplier < 1.0 {
                return invalid("retry.backoff_multiplier must be a finite value >= 1.0");
            }
        }

        if self.enable_real_time_updates && self.update_interval_ms.unwrap_or(0) == 0 {
            return invalid("update_interval_ms must be set and non-zero when real-time updates are enabled");
        }

        if self.journal_capacity == 0 {
            return invalid("journal_capacity must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();
        assert!(config.cache.is_none());
        assert!(config.retry.is_none());
        assert_eq!(config.debounce_delay(), Duration::from_millis(300));
        assert_eq!(config.update_interval(), None);

        let retry = config.effective_retry();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.retry_delay_ms, 1000);
        assert_eq!(retry.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_backoff_delays() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(1), Duration::from_millis(1000));
        assert_eq!(retry.delay_for(2), Duration::from_millis(2000));
        assert_eq!(retry.delay_for(3), Duration::from_millis(4000));

        let flat = RetryConfig::new(5, Duration::from_millis(250), 1.0);
        assert_eq!(flat.delay_for(4), Duration::from_millis(250));
    }

    #[test]
    fn test_load_toml() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
debounce_delay_ms = 150

[cache]
max_age_ms = 2000
max_size = 8
auto_cleanup = true

[retry]
max_retries = 5
"#
        )
        .unwrap();

        let config = FetchConfig::load(file.path()).unwrap();
        let cache = config.cache.unwrap();
        assert_eq!(cache.max_age(), Duration::from_secs(2));
        assert_eq!(cache.max_size, 8);
        assert!(cache.auto_cleanup);

        let retry = config.retry.unwrap();
        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.retry_delay_ms, 1000);
        assert_eq!(config.debounce_delay_ms, 150);
    }

    #[test]
    fn test_load_json_camel_case() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(
            file,
            r#"{{
                "cacheConfig": {{ "maxAge": 1000, "maxSize": 2 }},
                "enableRealTimeUpdates": true,
                "updateInterval": 30000
            }}"#
        )
        .unwrap();

        let config = FetchConfig::load(file.path()).unwrap();
        assert_eq!(config.cache.as_ref().map(|c| c.max_size), Some(2));
        assert_eq!(config.update_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_load_missing_file() {
        let result = FetchConfig::load(Path::new("/nonexistent/fetchcache.toml"));
        assert!(matches!(result, Err(FetchError::ConfigRead { .. })));
    }

    #[test]
    fn test_load_malformed() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "not json").unwrap();

        let result = FetchConfig::load(file.path());
        assert!(matches!(result, Err(FetchError::ConfigParse { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_size = FetchConfig::new().with_cache(CacheConfig::new(Duration::from_secs(1), 0));
        assert!(zero_size.validate().is_err());

        let zero_retries = FetchConfig::new().with_retry(RetryConfig::new(0, Duration::ZERO, 2.0));
        assert!(zero_retries.validate().is_err());

        let shrinking =
            FetchConfig::new().with_retry(RetryConfig::new(3, Duration::from_millis(10), 0.5));
        assert!(shrinking.validate().is_err());

        let no_interval = FetchConfig {
            enable_real_time_updates: true,
            ..FetchConfig::default()
        };
        assert!(matches!(
            no_interval.validate(),
            Err(FetchError::InvalidConfig { .. })
        ));

        assert!(FetchConfig::default().validate().is_ok());
    }
}
