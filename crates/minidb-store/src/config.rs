//! Store configuration
//!
//! A `StoreConfig` is built in code or read from TOML:
//!
//! ```toml
//! path = "app.db"
//! autoregister = true
//! debug = false
//! vacuum_on_close = false
//! busy_timeout_ms = 5000
//! create_if_missing = true
//! ```
//!
//! Every key is optional; unknown keys are rejected.

use std::path::{Path, PathBuf};

use minidb_core::errors::MdError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{config_error, io_error, Result};

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Database file; `None` opens a private in-memory database
    pub path: Option<PathBuf>,
    /// Register record types on first use instead of failing `UnknownClass`
    pub autoregister: bool,
    /// Echo every generated statement at info level
    pub debug: bool,
    /// Run `VACUUM` when the store closes
    pub vacuum_on_close: bool,
    pub busy_timeout_ms: u64,
    /// Create the database file when it does not exist yet
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            autoregister: false,
            debug: false,
            vacuum_on_close: false,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            create_if_missing: true,
        }
    }
}

#[derive(Debug, Error)]
enum ConfigError {
    #[error("Invalid store configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl From<ConfigError> for MdError {
    fn from(err: ConfigError) -> Self {
        config_error(&err.to_string())
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_autoregister(mut self, autoregister: bool) -> Self {
        self.autoregister = autoregister;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_vacuum_on_close(mut self, vacuum_on_close: bool) -> Self {
        self.vacuum_on_close = vacuum_on_close;
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn with_create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }

    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Returns a `Config` error for malformed TOML, unknown keys or values
    /// of the wrong type.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config = toml::from_str(source).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// A relative `path` inside the file is resolved against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error when the file cannot be read, otherwise see
    /// [`StoreConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| io_error("read_config", e))?;
        let mut config = Self::from_toml_str(&source)?;
        if let (Some(db_path), Some(dir)) = (config.path.as_ref(), path.parent()) {
            if db_path.is_relative() {
                config.path = Some(dir.join(db_path));
            }
        }
        Ok(config)
    }
}
