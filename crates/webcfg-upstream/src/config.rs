//! Upstream connection configuration.
//!
//! Defaults point at local development hosts. Override via environment
//! variables or explicit construction for tests.

use std::time::Duration;

use url::Url;

/// Backoff settings shared by every upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Where the telemetry catalogs live and how to reach them.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Primary (xconf) host.
    pub xconf_host: Url,
    /// Path of the primary catalog endpoint, appended to `xconf_host`.
    pub xconf_path: String,
    /// Whether the secondary profiles source is consulted.
    pub profiles_enabled: bool,
    /// Secondary profiles host.
    pub profiles_host: Url,
    /// Per-attempt request timeout in seconds.
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl UpstreamConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `WEBCFG_XCONF_HOST` (default: `http://localhost:12346`)
    /// - `WEBCFG_XCONF_PATH` (default: `/loguploader/getTelemetryProfiles`)
    /// - `WEBCFG_PROFILES_ENABLED` (default: false)
    /// - `WEBCFG_PROFILES_HOST` (default: `http://localhost:12347`)
    /// - `WEBCFG_UPSTREAM_TIMEOUT_SECS` (default: 10)
    /// - `WEBCFG_UPSTREAM_RETRIES` (default: 3)
    /// - `WEBCFG_UPSTREAM_RETRY_BASE_MS` (default: 200)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = RetryPolicy::default();
        Ok(Self {
            xconf_host: env_url("WEBCFG_XCONF_HOST", "http://localhost:12346")?,
            xconf_path: std::env::var("WEBCFG_XCONF_PATH")
                .unwrap_or_else(|_| "/loguploader/getTelemetryProfiles".to_string()),
            profiles_enabled: env_bool("WEBCFG_PROFILES_ENABLED", false)?,
            profiles_host: env_url("WEBCFG_PROFILES_HOST", "http://localhost:12347")?,
            timeout_secs: env_number("WEBCFG_UPSTREAM_TIMEOUT_SECS", 10),
            retry: RetryPolicy {
                max_retries: env_number("WEBCFG_UPSTREAM_RETRIES", defaults.max_retries),
                base_delay: Duration::from_millis(env_number(
                    "WEBCFG_UPSTREAM_RETRY_BASE_MS",
                    defaults.base_delay.as_millis() as u64,
                )),
            },
        })
    }

    /// Configuration pointing at local mock servers, with fast retries.
    pub fn local_mock(xconf: &str, profiles: Option<&str>) -> Result<Self, ConfigError> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(raw.to_string(), e.to_string()))
        };
        Ok(Self {
            xconf_host: parse(xconf)?,
            xconf_path: "/loguploader/getTelemetryProfiles".to_string(),
            profiles_enabled: profiles.is_some(),
            profiles_host: parse(profiles.unwrap_or("http://127.0.0.1:1"))?,
            timeout_secs: 5,
            retry: RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
            },
        })
    }
}

/// Telemetry pipeline switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Partner ids accepted from the partner header.
    pub valid_partners: Vec<String>,
    /// Append stored device query params to the primary query.
    pub supplementary_appending_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            valid_partners: vec!["comcast".to_string(), "cox".to_string()],
            supplementary_appending_enabled: false,
        }
    }
}

impl TelemetryConfig {
    /// Variables:
    /// - `WEBCFG_VALID_PARTNERS` (default: `comcast,cox`)
    /// - `WEBCFG_SUPPLEMENTARY_APPENDING_ENABLED` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            valid_partners: match std::env::var("WEBCFG_VALID_PARTNERS") {
                Ok(raw) => split_list(&raw),
                Err(_) => defaults.valid_partners,
            },
            supplementary_appending_enabled: env_bool(
                "WEBCFG_SUPPLEMENTARY_APPENDING_ENABLED",
                defaults.supplementary_appending_enabled,
            )?,
        })
    }
}

/// Split a comma list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_bool(var: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidBool(var.to_string(), raw)),
        },
        Err(_) => Ok(default),
    }
}

fn env_number<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid boolean for {0}: {1:?}")]
    InvalidBool(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("WEBCFG_TEST_ABSENT_URL_7731", "http://localhost:12346").unwrap();
        assert_eq!(url.as_str(), "http://localhost:12346/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("WEBCFG_TEST_BAD_URL", "not a url");
        let result = env_url("WEBCFG_TEST_BAD_URL", "http://localhost");
        std::env::remove_var("WEBCFG_TEST_BAD_URL");
        assert!(result.is_err());
    }

    #[test]
    fn env_bool_parses_and_rejects() {
        std::env::set_var("WEBCFG_TEST_BOOL_YES", "TRUE");
        std::env::set_var("WEBCFG_TEST_BOOL_BAD", "maybe");
        assert!(env_bool("WEBCFG_TEST_BOOL_YES", false).unwrap());
        assert!(env_bool("WEBCFG_TEST_BOOL_BAD", false).is_err());
        assert!(!env_bool("WEBCFG_TEST_BOOL_ABSENT_1297", false).unwrap());
        std::env::remove_var("WEBCFG_TEST_BOOL_YES");
        std::env::remove_var("WEBCFG_TEST_BOOL_BAD");
    }

    #[test]
    fn retry_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(200));
        assert_eq!(policy.delay(1), Duration::from_millis(400));
        assert_eq!(policy.delay(2), Duration::from_millis(800));
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(" comcast, ,cox,"), vec!["comcast", "cox"]);
    }

    #[test]
    fn local_mock_enables_profiles_only_when_given() {
        let cfg = UpstreamConfig::local_mock("http://127.0.0.1:9000", None).unwrap();
        assert!(!cfg.profiles_enabled);
        let cfg =
            UpstreamConfig::local_mock("http://127.0.0.1:9000", Some("http://127.0.0.1:9001"))
                .unwrap();
        assert!(cfg.profiles_enabled);
        assert_eq!(cfg.profiles_host.as_str(), "http://127.0.0.1:9001/");
    }
}
