//! Filesystem-backed template store and result sink.
//!
//! Layout under the store root:
//!
//! ```text
//! templates/<template id>.json
//! results/<session id>.json
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cbt_flow::{
    ResultSink, ResultSource, SessionResult, StoreError, Template, TemplateStore, is_valid_id,
};
use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub mod seed;

pub use seed::builtin_templates;

const TEMPLATES_DIR: &str = "templates";
const RESULTS_DIR: &str = "results";

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens (and creates when missing) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { root: root.into() };
        for dir in [store.templates_dir(), store.results_dir()] {
            fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        debug!(root = %store.root.display(), "store opened");
        Ok(store)
    }

    /// Platform data directory for the session tool.
    pub fn default_root() -> Option<PathBuf> {
        ProjectDirs::from("org", "cbt", "cbt-session").map(|dirs| dirs.data_dir().to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }

    fn template_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.templates_dir().join(format!("{id}.json")))
    }

    /// Writes the built-in templates when no template exists yet. Returns how many were written.
    pub fn seed_builtin(&self) -> Result<usize, StoreError> {
        if !json_files(&self.templates_dir())?.is_empty() {
            return Ok(0);
        }
        let templates = builtin_templates().map_err(|source| StoreError::Json {
            path: PathBuf::from("<builtin>"),
            source,
        })?;
        for template in &templates {
            self.save_template(template)?;
        }
        info!(count = templates.len(), "seeded built-in templates");
        Ok(templates.len())
    }
}

impl TemplateStore for FsStore {
    fn get_template(&self, id: &str) -> Result<Template, StoreError> {
        let path = self.template_path(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        read_json(&path)
    }

    fn list_templates(&self) -> Result<Vec<Template>, StoreError> {
        let mut templates: Vec<Template> = json_files(&self.templates_dir())?
            .iter()
            .filter_map(|path| match read_json(path) {
                Ok(template) => Some(template),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable template");
                    None
                }
            })
            .collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(templates)
    }

    fn save_template(&self, template: &Template) -> Result<(), StoreError> {
        let path = self.template_path(&template.id)?;
        write_json(&path, template)?;
        debug!(template_id = %template.id, "template saved");
        Ok(())
    }

    fn delete_template(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.template_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

impl ResultSink for FsStore {
    fn save_result(&self, result: &SessionResult) -> Result<(), StoreError> {
        let path = self
            .results_dir()
            .join(format!("{}.json", result.session_id));
        write_json(&path, result)
    }
}

impl ResultSource for FsStore {
    fn list_results(&self, template_id: Option<&str>) -> Result<Vec<SessionResult>, StoreError> {
        let mut results: Vec<SessionResult> = json_files(&self.results_dir())?
            .iter()
            .filter_map(|path| match read_json::<SessionResult>(path) {
                Ok(result) => Some(result),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable result");
                    None
                }
            })
            .filter(|result| template_id.is_none_or(|id| result.template_id == id))
            .collect();
        results.sort_by_key(|result| result.completed_at);
        Ok(results)
    }
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes through a sibling temp file so readers never see a partial document.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
