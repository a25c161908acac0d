use std::env;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing::info;

use cbt_flow_store::FsStore;

use crate::config::{Config, HOME_ENV};

pub mod delete;
pub mod export;
pub mod import;
pub mod lint;
pub mod list;
pub mod results;
pub mod run;
pub mod schema;

/// Settings shared by every subcommand. The store is opened only by commands that need it.
#[derive(Debug, Clone)]
pub struct Context {
    config: Config,
    data_dir: Option<PathBuf>,
}

impl Context {
    pub fn new(config: Config, data_dir: Option<PathBuf>) -> Self {
        Self { config, data_dir }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn open_store(&self) -> Result<FsStore> {
        let root = self
            .config
            .resolve_data_dir(self.data_dir.clone(), env::var_os(HOME_ENV))?;
        let store = FsStore::open(root.clone())
            .with_context(|| format!("failed to open data directory {}", root.display()))?;
        if self.config.seed_builtin {
            let seeded = store
                .seed_builtin()
                .context("failed to seed built-in templates")?;
            if seeded > 0 {
                info!(count = seeded, root = %root.display(), "first use: built-in templates added");
            }
        }
        Ok(store)
    }
}
