//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default REST base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Connection and polling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// REST base URL, without trailing slash
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Dashboard refresh interval
    pub poll_interval: Duration,

    /// Local data directory
    pub data_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            data_dir: PathBuf::from(".bidboard"),
        }
    }
}

impl ApiConfig {
    /// Read `BIDBOARD_API_URL`, `BIDBOARD_TIMEOUT_SECS`, `BIDBOARD_POLL_SECS`
    /// and `BIDBOARD_HOME`, falling back to defaults for unset or unparsable
    /// values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|&n| n > 0)
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            base_url: lookup("BIDBOARD_API_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.base_url),
            timeout: secs("BIDBOARD_TIMEOUT_SECS", defaults.timeout),
            poll_interval: secs("BIDBOARD_POLL_SECS", defaults.poll_interval),
            data_dir: lookup("BIDBOARD_HOME")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}
