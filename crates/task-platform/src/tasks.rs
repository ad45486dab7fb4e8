//! The platform's bundled task registrations — the Rust analogue of a
//! package whose modules each carry a `@task(name, queue)` decorator
//! that `TaskRegistry::auto_discover` force-imports at startup. Ships
//! with one example task type so a fresh deployment has something
//! schedulable out of the box; real deployments add their own
//! registration modules to the slice passed to `auto_discover`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use task_core::TaskResult;
use task_registry::{ParameterSpec, Task, TaskContext, TaskRegistry, TypeDescriptor};

/// Scrapes a subreddit's hot listing. Demonstrates a task with one
/// required string parameter and one defaulted integer parameter.
struct RedditScraper;

#[async_trait]
impl Task for RedditScraper {
    fn name(&self) -> &str {
        "reddit_scraper"
    }

    fn queue(&self) -> &str {
        "scrapers"
    }

    fn doc(&self) -> &str {
        "Scrapes a subreddit's hot listing."
    }

    fn parameters(&self) -> Vec<task_registry::ParameterDescriptor> {
        vec![
            ParameterSpec::new("subreddit", TypeDescriptor::Str).build(),
            ParameterSpec::new("limit", TypeDescriptor::Int)
                .default(serde_json::json!(25))
                .build(),
        ]
    }

    async fn execute(&self, _ctx: TaskContext, parameters: Value) -> TaskResult<Value> {
        Ok(parameters)
    }
}

/// Registration entry point, in the shape `auto_discover` expects.
pub fn register_default_tasks(registry: &TaskRegistry) {
    registry.register(Arc::new(RedditScraper));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tasks_register_cleanly() {
        let registry = TaskRegistry::new();
        registry.auto_discover(&[register_default_tasks]);
        assert!(registry.is_registered("reddit_scraper"));
    }
}
