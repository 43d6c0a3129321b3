//! Store configuration via TOML
//!
//! A [`StoreConfig`] names the store and selects the default aspect set that
//! items created without an explicit aspect factory receive. The defaults
//! enable every protection ("all on").
//!
//! # Example
//!
//! ```toml
//! name = "arm-kinematics"
//!
//! [aspects]
//! locking = true
//! lock_timeout_ms = 100
//! audit = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The TOML document could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Selection of the default aspect set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectConfig {
    /// Serialize reads and writes of each item with a timed lock
    #[serde(default = "default_true")]
    pub locking: bool,
    /// How long a guarded access waits for the item lock before it is refused
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Emit an audit event for every guarded access
    #[serde(default = "default_true")]
    pub audit: bool,
}

fn default_true() -> bool {
    true
}

fn default_lock_timeout_ms() -> u64 {
    100
}

impl Default for AspectConfig {
    fn default() -> Self {
        Self {
            locking: true,
            lock_timeout_ms: default_lock_timeout_ms(),
            audit: true,
        }
    }
}

impl AspectConfig {
    /// Every default aspect disabled
    pub fn none() -> Self {
        Self {
            locking: false,
            lock_timeout_ms: default_lock_timeout_ms(),
            audit: false,
        }
    }

    /// Lock acquisition timeout as a `Duration`
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns an error if locking is enabled with a zero timeout, which
    /// would refuse every access.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locking && self.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "lock_timeout_ms must be greater than zero when locking is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Data store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store name, used in diagnostics
    #[serde(default = "default_store_name")]
    pub name: String,
    /// Default aspect set for items created without a factory
    #[serde(default)]
    pub aspects: AspectConfig,
}

fn default_store_name() -> String {
    "data-store".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_store_name(),
            aspects: AspectConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# dmodel data store configuration
#
# Store name, used in diagnostics
name = "data-store"

[aspects]
# Serialize reads and writes of each item with a timed lock (default: true)
locking = true
# Milliseconds an access waits for the item lock before it is refused (default: 100)
lock_timeout_ms = 100
# Emit an audit event for every guarded access (default: true)
audit = true
"#
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(content)?;
        config.aspects.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Render the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}
