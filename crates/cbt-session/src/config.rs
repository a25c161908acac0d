use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::Deserialize;

use cbt_flow_store::FsStore;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "CBT_SESSION_HOME";

pub const DEFAULT_CAPTURE_PRIMARY: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub seed_builtin: bool,
    pub log_filter: Option<String>,
    pub default_capture_primary: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            seed_builtin: true,
            log_filter: None,
            default_capture_primary: DEFAULT_CAPTURE_PRIMARY,
        }
    }
}

impl Config {
    /// Loads `explicit` when given (it must exist), otherwise the platform config file if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Data directory by precedence: flag, environment, config file, platform default.
    pub fn resolve_data_dir(
        &self,
        flag: Option<PathBuf>,
        env: Option<OsString>,
    ) -> Result<PathBuf> {
        flag.or_else(|| env.filter(|value| !value.is_empty()).map(PathBuf::from))
            .or_else(|| self.data_dir.clone())
            .or_else(FsStore::default_root)
            .ok_or_else(|| anyhow!("no data directory; pass --data-dir or set {HOME_ENV}"))
    }
}

pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "cbt", "cbt-session").map(|dirs| dirs.config_dir().join("config.toml"))
}
