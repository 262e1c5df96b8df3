//! Environment-driven configuration
//!
//! Settings are read once at startup into a [`DocsConfig`] value that gets
//! passed to whatever needs it; nothing reads the environment afterwards.

use std::time::Duration;
use tracing::{debug, warn};

/// Default base URL for documentation fetches
pub const DEFAULT_BASE_URL: &str = "https://docs.phaser.io";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between retries in milliseconds
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Default cache TTL in seconds
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Runtime configuration for the documentation client
#[derive(Debug, Clone)]
pub struct DocsConfig {
    /// Base URL relative documentation paths resolve against
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retry attempts after the initial request
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_delay: Duration,
    /// Cache TTL; parsed and logged for forward compatibility, no cache is
    /// built from it
    pub cache_ttl: Duration,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl DocsConfig {
    /// Build a config from `PHASER_DOCS_*` environment variables
    ///
    /// Invalid values warn and fall back to the defaults rather than failing
    /// startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(timeout) = read_env_u64("PHASER_DOCS_TIMEOUT", |v| v > 0) {
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(retries) = read_env_u64("PHASER_DOCS_MAX_RETRIES", |_| true) {
            config.max_retries = retries as u32;
        }
        if let Some(ttl) = read_env_u64("PHASER_DOCS_CACHE_TTL", |_| true) {
            config.cache_ttl = Duration::from_secs(ttl);
        }

        debug!(
            timeout_secs = config.timeout.as_secs(),
            max_retries = config.max_retries,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "Loaded configuration"
        );
        config
    }

    /// Override the timeout (CLI flag wins over environment)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the backoff base delay
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Read an env var as u64, warning and returning None on bad values
fn read_env_u64(name: &str, valid: impl Fn(u64) -> bool) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(value) if valid(value) => Some(value),
        _ => {
            warn!(var = name, value = %raw, "Invalid value, using default");
            None
        }
    }
}
