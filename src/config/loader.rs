use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config validation failed: {message}")]
    Validation { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// `~/.config/freshstate/config.toml` on Unix, or the platform
    /// equivalent via `dirs::config_dir()`. Falls back to the current
    /// directory if no config dir is available.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("freshstate").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `Config::default()`; an existing file must
    /// parse and validate.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.simulation.failure_rate) {
            return Err(ConfigError::Validation {
                message: format!(
                    "simulation.failure_rate must be within [0, 1], got {}",
                    self.simulation.failure_rate
                ),
            });
        }

        if self.simulation.latency_min_ms > self.simulation.latency_max_ms {
            return Err(ConfigError::Validation {
                message: "simulation.latency_min_ms exceeds latency_max_ms".to_string(),
            });
        }

        if self.search.page_size == 0 {
            return Err(ConfigError::Validation {
                message: "search.page_size must be at least 1".to_string(),
            });
        }

        if self.search.min_query_chars == 0 {
            return Err(ConfigError::Validation {
                message: "search.min_query_chars must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.timing.debounce_ms, 300);
        assert_eq!(config.search.min_query_chars, 3);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[timing]
debounce_ms = 150

[simulation]
failure_rate = 0.0
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.timing.debounce_ms, 150);
        assert_eq!(config.timing.undo_grace_ms, 3000);
        assert_eq!(config.simulation.failure_rate, 0.0);
        assert_eq!(config.search.page_size, 5);
    }

    #[test]
    fn invalid_toml_fails_to_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "invalid { toml }").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn out_of_range_failure_rate_is_rejected() {
        let mut config = Config::default();
        config.simulation.failure_rate = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn inverted_latency_bounds_are_rejected() {
        let mut config = Config::default();
        config.simulation.latency_min_ms = 2000;
        config.simulation.latency_max_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut config = Config::default();
        config.search.page_size = 0;
        assert!(config.validate().is_err());
    }
}
