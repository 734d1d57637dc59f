//! Service configuration types.

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Socket address the HTTP server binds.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the sea-ice index API.
    #[serde(default = "default_nsidc_base_url")]
    pub nsidc_base_url: String,

    /// Timing parameters (seconds).
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Timing configuration (all values in seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Scheduled full-refresh interval.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Per-request timeout for upstream fetches.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Upper bound for a forced refresh via `/api/refresh`.
    #[serde(default = "default_refresh_request_timeout")]
    pub refresh_request_timeout_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_bind_addr() -> String {
    "0.0.0.0:5000".into()
}

fn default_nsidc_base_url() -> String {
    "https://nsidc.org/api/seaiceindex/v2".into()
}

fn default_refresh_interval() -> u64 {
    21_600 // 6 hours
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_refresh_request_timeout() -> u64 {
    60
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            refresh_request_timeout_secs: default_refresh_request_timeout(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            nsidc_base_url: default_nsidc_base_url(),
            timing: TimingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_deployment() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.timing.refresh_interval_secs, 21_600);
        assert_eq!(config.timing.fetch_timeout_secs, 30);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ServiceConfig =
            toml::from_str("bind_addr = \"127.0.0.1:8080\"").expect("partial config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.nsidc_base_url, default_nsidc_base_url());
        assert_eq!(config.timing.refresh_interval_secs, 21_600);
    }
}
