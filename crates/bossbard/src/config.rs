//! Daemon configuration.
//!
//! Loaded from a TOML file. Every field has a default, so a missing file
//! at the default location yields the default configuration.
//!
//! ```toml
//! socket_path = "/run/bossbar.sock"
//! max_clients = 64
//!
//! [welcome]
//! enabled = true
//! title = "Welcome"
//! color = "green"
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bossbar_core::BarColor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default socket path
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/bossbar.sock";

/// Environment variable overriding the socket path
pub const SOCKET_ENV_VAR: &str = "BOSSBAR_SOCKET";

/// Config file name under `<config_dir>/bossbar/`
pub const CONFIG_FILE_NAME: &str = "bossbard.toml";

/// Top-level daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Unix socket the server listens on
    pub socket_path: PathBuf,

    /// Maximum number of concurrently connected clients
    pub max_clients: usize,

    /// Maximum size of one inbound line in bytes
    pub max_message_size: usize,

    /// Idle read timeout in seconds
    pub read_timeout_secs: u64,

    /// Bar every new client is subscribed to
    pub welcome: WelcomeBarConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            max_clients: 64,
            max_message_size: 65_536,
            read_timeout_secs: 300,
            welcome: WelcomeBarConfig::default(),
        }
    }
}

/// Welcome bar shown to each client on connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelcomeBarConfig {
    pub enabled: bool,
    pub title: String,
    pub sub_title: String,
    pub percentage: f32,
    pub color: BarColor,
    /// Use a per-client bar so clients can be given their own view
    pub diverse: bool,
}

impl Default for WelcomeBarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            title: String::new(),
            sub_title: String::new(),
            percentage: 1.0,
            color: BarColor::default(),
            diverse: false,
        }
    }
}

impl DaemonConfig {
    /// Default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bossbar").join(CONFIG_FILE_NAME))
    }

    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and defaults are used if it is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)?
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parses a config file without validating it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parses config from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Applies `BOSSBAR_SOCKET` if set.
    pub fn apply_env(&mut self) {
        if let Ok(socket) = env::var(SOCKET_ENV_VAR) {
            if !socket.is_empty() {
                self.socket_path = PathBuf::from(socket);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("socket_path must not be empty".to_string()));
        }
        if self.max_clients == 0 {
            return Err(ConfigError::Invalid("max_clients must be at least 1".to_string()));
        }
        if self.max_message_size < 64 {
            return Err(ConfigError::Invalid(
                "max_message_size must be at least 64 bytes".to_string(),
            ));
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "read_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !self.welcome.percentage.is_finite() {
            return Err(ConfigError::Invalid(
                "welcome.percentage must be a finite number".to_string(),
            ));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Serializes the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Errors loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse {path}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
