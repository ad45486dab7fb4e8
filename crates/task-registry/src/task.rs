//! The `Task` trait: the Rust shape of "any callable registered with
//! `@task(name, queue)`". Each task declares its own parameter schema
//! via `parameters()` instead of having it synthesized from a function
//! signature.

use crate::parameter::ParameterDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use task_core::TaskResult;

/// Execution-time context injected by the worker host — the Rust
/// analogue of the reserved `context` parameter. Carries the identifiers
/// needed to label a fire.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task_id: String,
    pub config_id: Option<i64>,
}

/// A registrable unit of work. Implementors describe their own
/// parameter surface; the registry never inspects Rust type signatures
/// to do it for them.
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique name this task is registered under (the `task_type`).
    fn name(&self) -> &str;

    /// Queue this task's executions are dispatched to.
    fn queue(&self) -> &str;

    /// Human-readable docstring surfaced in the task-info UI output.
    fn doc(&self) -> &str {
        ""
    }

    /// The task's declared, UI-renderable parameter schema.
    fn parameters(&self) -> Vec<ParameterDescriptor>;

    /// Runs the task body with `parameters` (validated by the registry
    /// before this is ever called) and the injected `context`.
    async fn execute(&self, ctx: TaskContext, parameters: Value) -> TaskResult<Value>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::descriptor::TypeDescriptor;
    use crate::parameter::ParameterSpec;

    pub struct RedditScraper;

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

        fn parameters(&self) -> Vec<ParameterDescriptor> {
            vec![
                ParameterSpec::new("subreddit", TypeDescriptor::Str).build(),
                ParameterSpec::new("limit", TypeDescriptor::Int)
                    .default(serde_json::json!(25))
                    .build(),
                ParameterSpec::new("context", TypeDescriptor::Unknown).injected().build(),
            ]
        }

        async fn execute(&self, _ctx: TaskContext, parameters: Value) -> TaskResult<Value> {
            Ok(parameters)
        }
    }
}
