//! Production configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
#[cfg(not(test))]
use std::sync::OnceLock;
#[cfg(test)]
use std::sync::Mutex;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Parsing configuration
    pub processing: ProcessingConfig,

    /// Output configuration
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of lines between progress-sink ticks (spec.md §4.1).
    pub chunk_size: usize,
    /// Whether peak-value coordinate records are collected (spec.md §6).
    pub ignore_peaks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub json_pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "WARN".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            processing: ProcessingConfig {
                chunk_size: 10_000,
                ignore_peaks: true,
            },
            output: OutputConfig { json_pretty: true },
        }
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file if it exists
        let config_paths = ["eso-reader.toml", ".eso-reader.toml"];

        for path in config_paths.iter().map(Path::new) {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    #[cfg(feature = "basic")]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    #[cfg(not(feature = "basic"))]
    pub fn load_from_file(_path: &Path) -> Result<Self> {
        // Return default config when TOML support is not compiled in
        Ok(Self::default())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("ESO_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("ESO_LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("ESO_LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("ESO_CHUNK_SIZE") {
            self.processing.chunk_size = val.parse().context("Invalid ESO_CHUNK_SIZE")?;
        }
        if let Ok(val) = env::var("ESO_IGNORE_PEAKS") {
            self.processing.ignore_peaks = val.parse().context("Invalid ESO_IGNORE_PEAKS")?;
        }
        if let Ok(val) = env::var("ESO_JSON_PRETTY") {
            self.output.json_pretty = val.parse().context("Invalid ESO_JSON_PRETTY")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.processing.chunk_size == 0 {
            return Err(anyhow::anyhow!("chunk_size must be greater than 0"));
        }

        if self.logging.level.is_empty() {
            warn!("Empty log level configured, falling back to WARN");
        }

        Ok(())
    }

    /// Save current configuration to file
    #[allow(dead_code)]
    #[cfg(feature = "basic")]
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }

    #[allow(dead_code)]
    #[cfg(not(feature = "basic"))]
    pub fn save_to_file(&self, _path: &Path) -> Result<()> {
        anyhow::bail!("TOML configuration saving not available. Rebuild with --features basic")
    }
}

/// Global configuration instance
#[cfg(not(test))]
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Global configuration instance for tests (mutable)
#[cfg(test)]
static CONFIG: Mutex<Option<&'static Config>> = Mutex::new(None);

/// Get the global configuration instance
#[cfg(not(test))]
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| Config::load().expect("Failed to load configuration"))
}

/// Get the global configuration instance for tests
#[cfg(test)]
pub fn get_config() -> &'static Config {
    let mut guard = CONFIG.lock().unwrap();
    if let Some(config) = *guard {
        config
    } else {
        let config = Config::load().expect("Failed to load configuration");
        let config_ref: &'static Config = Box::leak(Box::new(config));
        *guard = Some(config_ref);
        config_ref
    }
}

/// Reset the global configuration for testing
#[cfg(test)]
pub fn reset_config_for_test() {
    let mut guard = CONFIG.lock().unwrap();
    *guard = None;
}
