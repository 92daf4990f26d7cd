//! Subcommands and the store options they share

use std::path::PathBuf;

use clap::Args;
use minidb_core::{MdError, MdErrorKind};
use minidb_store::{Store, StoreConfig};

pub mod count;
pub mod dump;
pub mod tables;

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// TOML store configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file; overrides `path` from the configuration
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Echo every statement to stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

impl StoreArgs {
    /// Effective configuration: file first, then flags
    ///
    /// The CLI only inspects databases, so a missing file is an error rather
    /// than a new empty database.
    pub fn store_config(&self) -> Result<StoreConfig, MdError> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_file(path)?,
            None => StoreConfig::default(),
        };
        if let Some(db) = &self.db {
            config = config.with_path(db);
        }
        if self.debug {
            config = config.with_debug(true);
        }
        config = config.with_create_if_missing(false);
        if config.is_in_memory() {
            return Err(MdError::new(MdErrorKind::Config)
                .with_message("no database given: pass --db or set `path` in --config"));
        }
        Ok(config)
    }

    pub fn open(&self) -> Result<Store, MdError> {
        Store::open(self.store_config()?)
    }
}
