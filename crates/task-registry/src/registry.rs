//! The task registry: `task_type → {callable, queue, doc, parameters}`,
//! plus the parameter-set validation the scheduler core calls at
//! schedule-build time.

use crate::parameter::ParameterDescriptor;
use crate::task::Task;
use parking_lot::RwLock;
use serde_json::Map;
use std::collections::HashMap;
use std::sync::Arc;
use task_core::{TaskError, TaskResult};
use tracing::{debug, info};

struct RegisteredTask {
    task: Arc<dyn Task>,
}

/// Process-memory mapping from `task_type` to its registered callable.
/// Written only at startup; read-only thereafter, so reads never
/// contend with a writer once the registration phase has completed.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, RegisteredTask>>>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task under its own declared name. Re-registering an
    /// existing name overwrites the previous entry — harmless at
    /// startup, but a signal of a naming collision worth logging.
    pub fn register(&self, task: Arc<dyn Task>) {
        let name = task.name().to_string();
        let mut tasks = self.tasks.write();
        if tasks.contains_key(&name) {
            tracing::warn!(task_type = %name, "re-registering task type, overwriting previous registration");
        }
        info!(task_type = %name, queue = %task.queue(), "task registered");
        tasks.insert(name, RegisteredTask { task });
    }

    /// Transitively "imports" every registration function in a package —
    /// the Rust analogue of forcing a package's decorators to run at
    /// startup. Each entry is called once, in order.
    pub fn auto_discover(&self, modules: &[fn(&TaskRegistry)]) {
        for module in modules {
            module(self);
        }
        debug!(modules = modules.len(), total_tasks = self.tasks.read().len(), "auto-discovery complete");
    }

    #[must_use]
    pub fn get_function(&self, task_type: &str) -> Option<Arc<dyn Task>> {
        self.tasks.read().get(task_type).map(|r| r.task.clone())
    }

    pub fn get_parameters(&self, task_type: &str) -> TaskResult<Vec<ParameterDescriptor>> {
        self.get_function(task_type)
            .map(|task| task.parameters())
            .ok_or_else(|| TaskError::not_found("task_type", task_type))
    }

    #[must_use]
    pub fn list_all(&self) -> Vec<TaskInfo> {
        self.tasks
            .read()
            .values()
            .map(|r| TaskInfo::from_task(r.task.as_ref()))
            .collect()
    }

    #[must_use]
    pub fn is_registered(&self, task_type: &str) -> bool {
        self.tasks.read().contains_key(task_type)
    }

    /// Asserts every required parameter of `task_type`'s function has a
    /// value in `parameters`. Unknown keys pass through untouched —
    /// they're handed to the callable as-is. Missing required
    /// parameters fail with the names collected, not just the first one.
    pub fn validate_parameters(&self, task_type: &str, parameters: &Map<String, serde_json::Value>) -> TaskResult<()> {
        let declared = self.get_parameters(task_type)?;
        let missing: Vec<String> = declared
            .iter()
            .filter(|p| p.required && !parameters.contains_key(&p.name))
            .map(|p| p.name.clone())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TaskError::validation(format!(
                "missing required parameter(s) for `{task_type}`: {}",
                missing.join(", ")
            )))
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-task-type summary: the task-info output shape.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskInfo {
    pub name: String,
    pub worker_name: String,
    pub queue: String,
    pub doc: String,
    pub has_parameters: bool,
    pub parameters: Vec<ParameterDescriptor>,
}

impl TaskInfo {
    fn from_task(task: &dyn Task) -> Self {
        let parameters = task.parameters();
        Self {
            name: task.name().to_string(),
            worker_name: task.name().to_string(),
            queue: task.queue().to_string(),
            doc: task.doc().to_string(),
            has_parameters: !parameters.is_empty(),
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::test_support::RedditScraper;

    fn registry_with_reddit_scraper() -> TaskRegistry {
        let registry = TaskRegistry::new();
        registry.register(Arc::new(RedditScraper));
        registry
    }

    #[test]
    fn registered_task_is_retrievable_by_name() {
        let registry = registry_with_reddit_scraper();
        assert!(registry.is_registered("reddit_scraper"));
        assert!(registry.get_function("reddit_scraper").is_some());
        assert!(registry.get_function("nonexistent").is_none());
    }

    #[test]
    fn totality_every_registered_task_yields_parameters() {
        let registry = registry_with_reddit_scraper();
        for info in registry.list_all() {
            let params = registry.get_parameters(&info.name).unwrap();
            for p in &params {
                assert_eq!(p.required, p.default.is_none() && p.ui.exclude_from_ui != Some(true));
            }
        }
    }

    #[test]
    fn validate_parameters_rejects_missing_required() {
        let registry = registry_with_reddit_scraper();
        let params = Map::new();
        let err = registry.validate_parameters("reddit_scraper", &params).unwrap_err();
        match err {
            TaskError::Validation(msg) => assert!(msg.contains("subreddit")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_parameters_allows_unknown_keys_through() {
        let registry = registry_with_reddit_scraper();
        let mut params = Map::new();
        params.insert("subreddit".to_string(), serde_json::json!("rust"));
        params.insert("unexpected_extra".to_string(), serde_json::json!(true));
        assert!(registry.validate_parameters("reddit_scraper", &params).is_ok());
    }

    #[test]
    fn validate_parameters_on_unregistered_type_is_not_found() {
        let registry = TaskRegistry::new();
        let err = registry.validate_parameters("ghost", &Map::new()).unwrap_err();
        assert!(matches!(err, TaskError::NotFound { .. }));
    }

    #[test]
    fn auto_discover_runs_every_supplied_module() {
        fn register_reddit(registry: &TaskRegistry) {
            registry.register(Arc::new(RedditScraper));
        }
        let registry = TaskRegistry::new();
        registry.auto_discover(&[register_reddit]);
        assert_eq!(registry.len(), 1);
    }
}
