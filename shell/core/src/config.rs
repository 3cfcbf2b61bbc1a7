//! TOML Configuration File Support
//!
//! Tunables of the dispatch engine, loaded from
//! `$XDG_CONFIG_HOME/termshell/shell.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the binary after loading)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [input]
//! double_click_ms = 400
//! mouse = true
//! paste = true
//!
//! [dispatch]
//! resize_throttle_ms = 50
//! queue_capacity = 100
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::debounce::DEFAULT_RESIZE_THROTTLE;
use crate::dispatch::DEFAULT_QUEUE_CAPACITY;

/// Default maximum interval between the clicks of a double-click
pub const DEFAULT_DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Where the effective configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[input]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputToml {
    /// Double-click window in milliseconds (0 disables double-click)
    pub double_click_ms: Option<u64>,

    /// Whether pointer reporting is enabled
    pub mouse: Option<bool>,

    /// Whether bracketed paste is enabled
    pub paste: Option<bool>,
}

/// `[dispatch]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchToml {
    /// Minimum interval between processed resizes in milliseconds
    pub resize_throttle_ms: Option<u64>,

    /// Capacity of the event and work queues
    pub queue_capacity: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellToml {
    /// Input section
    pub input: InputToml,

    /// Dispatch section
    pub dispatch: DispatchToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Effective engine configuration
#[derive(Clone, Debug)]
pub struct ShellConfig {
    /// Maximum time between two clicks of a double-click; zero disables
    pub double_click_window: Duration,

    /// Minimum interval between processed resizes
    pub resize_throttle: Duration,

    /// Capacity of the event and work queues
    pub queue_capacity: usize,

    /// Whether bracketed paste is enabled
    pub enable_paste: bool,

    /// Whether pointer reporting is enabled
    pub enable_mouse: bool,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            double_click_window: DEFAULT_DOUBLE_CLICK_WINDOW,
            resize_throttle: DEFAULT_RESIZE_THROTTLE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enable_paste: true,
            enable_mouse: false,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ShellConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero queue capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/termshell/shell.toml` or
/// `~/.config/termshell/shell.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("termshell").join("shell.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values are invalid. A missing config file is not an error.
pub fn load_config() -> Result<ShellConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// If `path` is `None`, only defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting values are invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ShellConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration reading environment values through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<ShellConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ShellConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ShellToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut ShellConfig, toml: &ShellToml) {
    if let Some(ms) = toml.input.double_click_ms {
        config.double_click_window = Duration::from_millis(ms);
    }
    if let Some(mouse) = toml.input.mouse {
        config.enable_mouse = mouse;
    }
    if let Some(paste) = toml.input.paste {
        config.enable_paste = paste;
    }

    if let Some(ms) = toml.dispatch.resize_throttle_ms {
        config.resize_throttle = Duration::from_millis(ms);
    }
    if let Some(capacity) = toml.dispatch.queue_capacity {
        config.queue_capacity = capacity;
    }
}

fn parse_flag(value: &str) -> bool {
    value != "0" && value.to_lowercase() != "false"
}

fn apply_env_config<F>(config: &mut ShellConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env("TERMSHELL_DOUBLE_CLICK_MS") {
        if let Ok(ms) = value.parse::<u64>() {
            config.double_click_window = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(value) = env("TERMSHELL_RESIZE_THROTTLE_MS") {
        if let Ok(ms) = value.parse::<u64>() {
            config.resize_throttle = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(value) = env("TERMSHELL_QUEUE_CAPACITY") {
        if let Ok(n) = value.parse::<usize>() {
            config.queue_capacity = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(value) = env("TERMSHELL_MOUSE") {
        config.enable_mouse = parse_flag(&value);
        config.source = ConfigSource::Env;
    }
    if let Some(value) = env("TERMSHELL_PASTE") {
        config.enable_paste = parse_flag(&value);
        config.source = ConfigSource::Env;
    }
}
