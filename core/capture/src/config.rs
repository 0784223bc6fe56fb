use std::path::PathBuf;
use std::time::Duration;

use crate::network::{DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_URL};

pub const DEFAULT_ADDR: &str = "127.0.0.1:21960";

/// Runtime settings for the capture service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub probe_url: String,
    pub probe_timeout: Duration,
}

impl ServiceConfig {
    /// Read settings from `SNAPMARK_*` environment variables
    pub fn from_env() -> Self {
        let db_path = std::env::var("SNAPMARK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        let bind_addr = std::env::var("SNAPMARK_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

        let probe_url =
            std::env::var("SNAPMARK_PROBE_URL").unwrap_or_else(|_| DEFAULT_PROBE_URL.to_string());

        let probe_timeout =
            parse_timeout_ms(std::env::var("SNAPMARK_PROBE_TIMEOUT_MS").ok().as_deref());

        Self {
            db_path,
            bind_addr,
            probe_url,
            probe_timeout,
        }
    }
}

fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/snapmark/snapmark.db")
}

/// Millisecond timeout from an optional setting, defaulting when absent, zero or malformed
pub fn parse_timeout_ms(raw: Option<&str>) -> Duration {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_PROBE_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeout_ms() {
        assert_eq!(parse_timeout_ms(None), DEFAULT_PROBE_TIMEOUT);
        assert_eq!(parse_timeout_ms(Some("750")), Duration::from_millis(750));
        assert_eq!(parse_timeout_ms(Some(" 50 ")), Duration::from_millis(50));
        assert_eq!(parse_timeout_ms(Some("0")), DEFAULT_PROBE_TIMEOUT);
        assert_eq!(parse_timeout_ms(Some("soon")), DEFAULT_PROBE_TIMEOUT);
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("SNAPMARK_DB_PATH", "/tmp/snapmark-test.db");
        std::env::set_var("SNAPMARK_ADDR", "0.0.0.0:9999");

        let config = ServiceConfig::from_env();
        assert_eq!(config.db_path, PathBuf::from("/tmp/snapmark-test.db"));
        assert_eq!(config.bind_addr, "0.0.0.0:9999");
        assert_eq!(config.probe_url, DEFAULT_PROBE_URL);

        std::env::remove_var("SNAPMARK_DB_PATH");
        std::env::remove_var("SNAPMARK_ADDR");
    }
}
