//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::client::ClientConfig;
use crate::types::Server;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied when a command does not say otherwise
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub server: Server,
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

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
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
    ///
    /// Files that exist but fail to load are skipped and returned alongside
    /// the config, so the caller can report them once logging is up.
    pub fn load_default() -> (Self, Vec<ConfigError>) {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("penguin-stats").join("config.toml")),
            Some(PathBuf::from("./penguin-stats.toml")),
        ];
        let config_paths: Vec<PathBuf> = config_paths.into_iter().flatten().collect();

        Self::load_first(&config_paths)
    }

    fn load_first(paths: &[PathBuf]) -> (Self, Vec<ConfigError>) {
        let mut skipped = Vec::new();

        for path in paths.iter().filter(|path| path.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => return (config, skipped),
                Err(e) => skipped.push(e),
            }
        }

        (Self::from_env(), skipped)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overrides that fail to parse are ignored
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PENGUIN_BASE_URL") {
            self.client.base_url = url;
        }
        if let Some(url) = lookup("PENGUIN_PLANNER_URL") {
            self.client.planner_url = url;
        }
        if let Some(secs) = lookup("PENGUIN_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.client.timeout_secs = secs;
        }
        if let Some(source) = lookup("PENGUIN_SOURCE") {
            self.client.source = Some(source);
        }
        if let Some(server) = lookup("PENGUIN_SERVER").and_then(|v| v.parse().ok()) {
            self.defaults.server = server;
        }

        if let Some(level) = lookup("PENGUIN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PENGUIN_LOG_FORMAT") {
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
    r#"# Penguin Statistics client configuration
#
# Environment variables override these settings:
# - PENGUIN_BASE_URL
# - PENGUIN_PLANNER_URL
# - PENGUIN_TIMEOUT_SECS
# - PENGUIN_SOURCE
# - PENGUIN_SERVER
# - PENGUIN_LOG_LEVEL
# - PENGUIN_LOG_FORMAT

[client]
# API root
base_url = "https://penguin-stats.io/PenguinStats/api/v2"

# Planner endpoint
planner_url = "https://planner.penguin-stats.io/plan"

# Request timeout in seconds, 0 for none
timeout_secs = 5

# Name of the reporting tool, sent with drop reports
# source = "my-tool"

# Version of the reporting tool
# version = "1.0.0"

[defaults]
# Server used when a command does not name one: US, CN, JP or KR
server = "CN"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty or json
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.client, ClientConfig::default());
        assert_eq!(config.defaults.server, Server::Cn);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [client]
            timeout_secs = 10
            source = "my-tool"

            [defaults]
            server = "US"
            "#,
        )
        .unwrap();

        assert_eq!(config.client.timeout_secs, 10);
        assert_eq!(config.client.source.as_deref(), Some("my-tool"));
        assert_eq!(config.client.base_url, crate::client::BASE_URL);
        assert_eq!(config.defaults.server, Server::Us);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_unknown_server_is_rejected() {
        assert!(Config::parse("[defaults]\nserver = \"EU\"").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("PENGUIN_BASE_URL", "http://localhost:9000"),
            ("PENGUIN_TIMEOUT_SECS", "12"),
            ("PENGUIN_SERVER", "jp"),
            ("PENGUIN_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.client.base_url, "http://localhost:9000");
        assert_eq!(config.client.timeout_secs, 12);
        assert_eq!(config.defaults.server, Server::Jp);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "PENGUIN_TIMEOUT_SECS" => Some("soon".to_string()),
            "PENGUIN_SERVER" => Some("EU".to_string()),
            _ => None,
        });

        assert_eq!(config.client.timeout_secs, 5);
        assert_eq!(config.defaults.server, Server::Cn);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_first_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        let good = dir.path().join("good.toml");
        std::fs::write(&broken, "[client\n").unwrap();
        std::fs::write(&good, "[logging]\nformat = \"json\"\n").unwrap();

        let paths = vec![dir.path().join("missing.toml"), broken, good];
        let (config, skipped) = Config::load_first(&paths);

        assert_eq!(config.logging.format, "json");
        assert_eq!(skipped.len(), 1);
        assert!(matches!(skipped[0], ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_first_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, skipped) = Config::load_first(&[dir.path().join("missing.toml")]);

        assert!(skipped.is_empty());
        assert_eq!(config.client.base_url, crate::client::BASE_URL);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[client\n").unwrap();
        assert!(matches!(Config::load(&broken), Err(ConfigError::Parse { .. })));
    }
}
