//! Service configuration, loaded once at startup.

use webcfg_core::{PokeTargets, SubdocRegistry};
use webcfg_upstream::config::split_list;
use webcfg_upstream::{ConfigError, TelemetryConfig, UpstreamConfig};

/// Everything the service reads from its environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Upper bound on handling one request, upstream calls included.
    pub request_timeout_secs: u64,
    /// Subdocument ids added to the built-in registry.
    pub extra_subdoc_ids: Vec<String>,
    pub poke_targets: PokeTargets,
    pub upstream: UpstreamConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `WEBCFG_PORT` (default: 8080)
    /// - `WEBCFG_REQUEST_TIMEOUT_SECS` (default: 30)
    /// - `WEBCFG_EXTRA_SUBDOC_IDS` (default: none)
    /// - `WEBCFG_POKE_DOCS` (default: `primary,telemetry`)
    /// - `WEBCFG_POKE_ROUTES` (default: `mqtt`)
    ///
    /// plus the upstream and telemetry variables documented on
    /// [`UpstreamConfig::from_env`] and [`TelemetryConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = PokeTargets::default();
        Ok(Self {
            port: env_number("WEBCFG_PORT", 8080),
            request_timeout_secs: env_number("WEBCFG_REQUEST_TIMEOUT_SECS", 30),
            extra_subdoc_ids: std::env::var("WEBCFG_EXTRA_SUBDOC_IDS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            poke_targets: PokeTargets {
                docs: env_list("WEBCFG_POKE_DOCS").unwrap_or(defaults.docs),
                routes: env_list("WEBCFG_POKE_ROUTES").unwrap_or(defaults.routes),
            },
            upstream: UpstreamConfig::from_env()?,
            telemetry: TelemetryConfig::from_env()?,
        })
    }

    /// Configuration pointing at local mock upstreams.
    pub fn local(xconf: &str, profiles: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: 0,
            request_timeout_secs: 5,
            extra_subdoc_ids: Vec::new(),
            poke_targets: PokeTargets::default(),
            upstream: UpstreamConfig::local_mock(xconf, profiles)?,
            telemetry: TelemetryConfig::default(),
        })
    }

    /// The built-in registry extended with the configured ids.
    pub fn registry(&self) -> SubdocRegistry {
        SubdocRegistry::builtin().with_extra_ids(&self.extra_subdoc_ids)
    }
}

fn env_list(var: &str) -> Option<Vec<String>> {
    std::env::var(var).ok().map(|raw| split_list(&raw))
}

fn env_number<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_includes_extra_ids() {
        let mut config = AppConfig::local("http://127.0.0.1:1", None).unwrap();
        config.extra_subdoc_ids = vec!["gwtest".to_string()];
        let registry = config.registry();
        assert!(registry.contains("gwtest"));
        assert!(registry.contains("lan"));
    }

    #[test]
    fn env_number_falls_back_on_garbage() {
        std::env::set_var("WEBCFG_TEST_PORT_GARBAGE", "eighty");
        assert_eq!(env_number("WEBCFG_TEST_PORT_GARBAGE", 8080u16), 8080);
        std::env::remove_var("WEBCFG_TEST_PORT_GARBAGE");
    }
}
