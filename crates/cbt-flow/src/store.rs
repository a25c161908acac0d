use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::result::SessionResult;
use crate::spec::template::Template;

/// Source of templates, keyed by template id.
pub trait TemplateStore {
    fn get_template(&self, id: &str) -> Result<Template, StoreError>;
    fn list_templates(&self) -> Result<Vec<Template>, StoreError>;
    fn save_template(&self, template: &Template) -> Result<(), StoreError>;
    /// Returns whether a template was removed.
    fn delete_template(&self, id: &str) -> Result<bool, StoreError>;
}

/// Destination of completed live runs.
pub trait ResultSink: Send + Sync {
    fn save_result(&self, result: &SessionResult) -> Result<(), StoreError>;
}

/// Read side of persisted results.
pub trait ResultSource {
    /// Results ordered by completion time, optionally filtered by template.
    fn list_results(&self, template_id: Option<&str>) -> Result<Vec<SessionResult>, StoreError>;
}

/// In-process store for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    templates: Mutex<BTreeMap<String, Template>>,
    results: Mutex<Vec<SessionResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: impl IntoIterator<Item = Template>) -> Self {
        let store = Self::new();
        {
            let mut map = lock(&store.templates);
            for template in templates {
                map.insert(template.id.clone(), template);
            }
        }
        store
    }

    pub fn result_count(&self) -> usize {
        lock(&self.results).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TemplateStore for MemoryStore {
    fn get_template(&self, id: &str) -> Result<Template, StoreError> {
        lock(&self.templates)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list_templates(&self) -> Result<Vec<Template>, StoreError> {
        Ok(lock(&self.templates).values().cloned().collect())
    }

    fn save_template(&self, template: &Template) -> Result<(), StoreError> {
        lock(&self.templates).insert(template.id.clone(), template.clone());
        Ok(())
    }

    fn delete_template(&self, id: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.templates).remove(id).is_some())
    }
}

impl ResultSink for MemoryStore {
    fn save_result(&self, result: &SessionResult) -> Result<(), StoreError> {
        lock(&self.results).push(result.clone());
        Ok(())
    }
}

impl ResultSource for MemoryStore {
    fn list_results(&self, template_id: Option<&str>) -> Result<Vec<SessionResult>, StoreError> {
        let mut results: Vec<SessionResult> = lock(&self.results)
            .iter()
            .filter(|result| template_id.is_none_or(|id| result.template_id == id))
            .cloned()
            .collect();
        results.sort_by_key(|result| result.completed_at);
        Ok(results)
    }
}
