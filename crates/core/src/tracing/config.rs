//! Configuration for tracing and instrumentation

use serde::{Deserialize, Serialize};

/// Main instrumentation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name attached to log output
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log level filter (e.g., "info", "debug", "trace")
    pub log_level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "wallpaper-admin".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl InstrumentationConfig {
    /// Build a configuration from `WALLPAPER_LOG_LEVEL` and `WALLPAPER_LOG_JSON`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("WALLPAPER_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(json) = std::env::var("WALLPAPER_LOG_JSON") {
            config.json = matches!(json.as_str(), "1" | "true" | "yes");
        }
        config
    }

    /// Verbose configuration for local development
    pub fn dev() -> Self {
        Self {
            log_level: "debug,reqwest=info,hyper=info".to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_config_is_verbose_for_crate_targets() {
        let config = InstrumentationConfig::dev();
        assert!(config.log_level.starts_with("debug"));
        assert_eq!(config.service_name, "wallpaper-admin");
        assert!(!config.json);
    }
}
