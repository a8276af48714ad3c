//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::push::PushConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Notification queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Auto-dismiss delay for non-persistent notifications (ms)
    #[serde(default = "default_dismiss_after")]
    pub dismiss_after_ms: u64,
}

fn default_dismiss_after() -> u64 {
    5000
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: default_dismiss_after(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("emberlink").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Push overrides
        if let Ok(url) = std::env::var("EMBERLINK_PUSH_URL") {
            self.push.url = url;
        }
        if let Ok(attempts) = std::env::var("EMBERLINK_MAX_RECONNECT_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.push.max_reconnect_attempts = n;
            }
        }
        if let Ok(base) = std::env::var("EMBERLINK_RECONNECT_BASE_MS") {
            if let Ok(ms) = base.parse() {
                self.push.reconnect_base_ms = ms;
            }
        }

        // Notification overrides
        if let Ok(delay) = std::env::var("EMBERLINK_DISMISS_AFTER_MS") {
            if let Ok(ms) = delay.parse() {
                self.notify.dismiss_after_ms = ms;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("EMBERLINK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("EMBERLINK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Emberlink Client Configuration
#
# Environment variables override these settings:
# - EMBERLINK_PUSH_URL
# - EMBERLINK_MAX_RECONNECT_ATTEMPTS
# - EMBERLINK_RECONNECT_BASE_MS
# - EMBERLINK_DISMISS_AFTER_MS
# - EMBERLINK_LOG_LEVEL
# - EMBERLINK_LOG_FORMAT

[push]
# Push endpoint URL
url = "ws://localhost:8090/ws"

# Maximum automatic reconnect attempts after a connection loss
max_reconnect_attempts = 5

# Backoff base in milliseconds; retry n waits base * n
reconnect_base_ms = 1000

[notify]
# Auto-dismiss delay for non-persistent notifications (ms)
dismiss_after_ms = 5000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.push.url, "ws://localhost:8090/ws");
        assert_eq!(config.push.max_reconnect_attempts, 5);
        assert_eq!(config.push.reconnect_base_ms, 1000);
        assert_eq!(config.notify.dismiss_after_ms, 5000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[push]\nurl = \"wss://push.emberlink.app/ws\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.push.url, "wss://push.emberlink.app/ws");
        assert_eq!(config.push.max_reconnect_attempts, 5);
        assert_eq!(config.notify.dismiss_after_ms, 5000);
    }

    #[test]
    fn test_generated_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.push.max_reconnect_attempts, 5);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = Config::load(Path::new("/nonexistent/emberlink.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
