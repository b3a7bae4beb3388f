//! Client configuration from the environment

use crate::state_machine::DEFAULT_TRANSITION_DELAY;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Settings for one client run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the report service, without trailing slash
    pub base_url: String,
    /// Pause between receiving the report and offering the download
    pub transition_delay: Duration,
    pub request_timeout: Duration,
    /// Directory downloaded reports are written to
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            transition_delay: DEFAULT_TRANSITION_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let base_url = get("REPORT_SERVICE_URL")
            .map_or(defaults.base_url, |url| url.trim().trim_end_matches('/').to_string());

        let transition_delay = get("REPORT_TRANSITION_DELAY_MS")
            .and_then(|raw| parse_or_warn::<u64>("REPORT_TRANSITION_DELAY_MS", &raw))
            .map_or(defaults.transition_delay, Duration::from_millis);

        let request_timeout = get("REPORT_REQUEST_TIMEOUT_SECS")
            .and_then(|raw| parse_or_warn::<u64>("REPORT_REQUEST_TIMEOUT_SECS", &raw))
            .filter(|secs| *secs > 0)
            .map_or(defaults.request_timeout, Duration::from_secs);

        let download_dir = get("REPORT_DOWNLOAD_DIR").map_or(defaults.download_dir, PathBuf::from);

        Self {
            base_url,
            transition_delay,
            request_timeout,
            download_dir,
        }
    }
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = raw, "Ignoring unparseable setting, using default");
    }
    parsed
}
