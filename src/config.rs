//! Configuration loader — merges env vars, .env file, and config.toml.

use common::{Error, ServiceConfig};
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn validate_config(config: &ServiceConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        issues.push(format!(
            "bind_addr {:?} is not a valid socket address",
            config.bind_addr
        ));
    }
    if config.nsidc_base_url.trim().is_empty() {
        issues.push("nsidc_base_url must not be empty".into());
    }

    if config.timing.refresh_interval_secs == 0 {
        issues.push("timing.refresh_interval_secs must be > 0".into());
    }
    if config.timing.fetch_timeout_secs == 0 {
        issues.push("timing.fetch_timeout_secs must be > 0".into());
    }
    if config.timing.refresh_request_timeout_secs == 0 {
        issues.push("timing.refresh_request_timeout_secs must be > 0".into());
    }
    if config.timing.refresh_request_timeout_secs < config.timing.fetch_timeout_secs {
        issues.push(
            "timing.refresh_request_timeout_secs must be >= timing.fetch_timeout_secs".into(),
        );
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load service configuration from environment and optional config file.
pub fn load_config() -> Result<ServiceConfig, Error> {
    // 1. Load .env file from the working directory or parents.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = ServiceConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(raw) = std::env::var("PORT") {
        let port = raw
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::Config("PORT must be an integer in 1-65535".into()))?;
        config.bind_addr = format!("0.0.0.0:{}", port);
    }
    if let Ok(addr) = std::env::var("ICE_BIND_ADDR") {
        config.bind_addr = addr;
    }
    if let Ok(url) = std::env::var("ICE_NSIDC_BASE_URL") {
        config.nsidc_base_url = url;
    }
    if let Ok(raw) = std::env::var("ICE_REFRESH_INTERVAL_SECS") {
        config.timing.refresh_interval_secs =
            parse_positive_u64(&raw, "ICE_REFRESH_INTERVAL_SECS")?;
    }
    if let Ok(raw) = std::env::var("ICE_FETCH_TIMEOUT_SECS") {
        config.timing.fetch_timeout_secs = parse_positive_u64(&raw, "ICE_FETCH_TIMEOUT_SECS")?;
    }
    if let Ok(raw) = std::env::var("ICE_REFRESH_REQUEST_TIMEOUT_SECS") {
        config.timing.refresh_request_timeout_secs =
            parse_positive_u64(&raw, "ICE_REFRESH_REQUEST_TIMEOUT_SECS")?;
    }

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        validate_config(&ServiceConfig::default()).expect("defaults should be valid");
    }

    #[test]
    fn test_bad_bind_addr_is_rejected() {
        let mut config = ServiceConfig::default();
        config.bind_addr = "not-an-addr".into();
        let err = validate_config(&config).expect_err("should be rejected");
        assert!(err.to_string().contains("bind_addr"));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config = ServiceConfig::default();
        config.timing.refresh_interval_secs = 0;
        let err = validate_config(&config).expect_err("should be rejected");
        assert!(err.to_string().contains("refresh_interval_secs"));
    }

    #[test]
    fn test_refresh_bound_must_cover_fetch_timeout() {
        let mut config = ServiceConfig::default();
        config.timing.fetch_timeout_secs = 90;
        config.timing.refresh_request_timeout_secs = 60;
        let err = validate_config(&config).expect_err("should be rejected");
        assert!(err.to_string().contains("refresh_request_timeout_secs"));
    }

    #[test]
    fn test_parse_positive_u64_rejects_zero_and_garbage() {
        assert!(parse_positive_u64("0", "X").is_err());
        assert!(parse_positive_u64("abc", "X").is_err());
        assert_eq!(parse_positive_u64(" 42 ", "X").expect("valid"), 42);
    }
}
