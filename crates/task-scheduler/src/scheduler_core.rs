//! The scheduler core. Turns a `TaskConfig` into a live
//! cron-table entry (or refuses to, for `MANUAL` configs), and answers
//! next-run-time queries — the generalized, config-driven form of a
//! hardcoded `Scheduler::schedule(name, cron_expr, factory)` call.

use crate::cron_engine::{CronEngine, CronEntry, ScheduleRule};
use chrono::Utc;
use std::sync::Arc;
use task_core::{SchedulerType, TaskConfig, TaskError, TaskResult};
use task_redis::RedisKeys;
use task_registry::TaskRegistry;

/// Summary of one live schedule, independent of the engine backing it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScheduleSummary {
    pub schedule_id: String,
    pub task_type: String,
    pub config_id: i64,
    pub next_run: Option<chrono::DateTime<Utc>>,
}

pub struct SchedulerCore<E: CronEngine> {
    engine: E,
}

impl<E: CronEngine> SchedulerCore<E> {
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Builds and submits a live cron-table entry for `config`.
    ///
    /// Refuses `MANUAL` configs — they have nothing to register. The
    /// task type must be a registered, known callable, and the
    /// declared parameters must satisfy that callable's required set,
    /// otherwise registration never reaches the engine.
    pub fn register(&self, config: &TaskConfig, registry: &TaskRegistry, force_schedule_id: Option<String>) -> TaskResult<String> {
        if config.scheduler_type == SchedulerType::Manual {
            return Err(TaskError::conflict(format!(
                "task_config {} is MANUAL and cannot be registered with the scheduler",
                config.id
            )));
        }
        config.validate_schedule_shape()?;

        if !registry.is_registered(&config.task_type) {
            return Err(TaskError::not_found("task_type", &config.task_type));
        }
        registry.validate_parameters(&config.task_type, &config.parameters)?;

        let rule = match &config.schedule_config {
            task_core::ScheduleConfig::Manual => unreachable!("validate_schedule_shape rejected this above"),
            task_core::ScheduleConfig::Cron { cron_expression } => ScheduleRule::Cron(cron_expression.clone()),
            task_core::ScheduleConfig::Date { run_at } => ScheduleRule::Date(*run_at),
        };

        let schedule_id = RedisKeys::build_schedule_id(config.id.into_inner(), force_schedule_id.as_deref());
        let entry = CronEntry {
            schedule_id: schedule_id.clone(),
            task_type: config.task_type.clone(),
            config_id: config.id.into_inner(),
            rule,
        };
        self.engine.add(entry)?;
        Ok(schedule_id)
    }

    /// Idempotent: removing a `schedule_id` that was never present is
    /// not an error, it just reports `false`.
    pub fn unregister(&self, schedule_id: &str) -> bool {
        self.engine.remove(schedule_id)
    }

    #[must_use]
    pub fn is_present(&self, schedule_id: &str) -> bool {
        self.engine.contains(schedule_id)
    }

    #[must_use]
    pub fn next_run_time(&self, schedule_id: &str) -> Option<chrono::DateTime<Utc>> {
        self.engine.get(schedule_id)?.next_run_from(Utc::now())
    }

    #[must_use]
    pub fn list_all(&self) -> Vec<ScheduleSummary> {
        let now = Utc::now();
        self.engine
            .list_all()
            .into_iter()
            .map(|entry| ScheduleSummary {
                next_run: entry.next_run_from(now),
                schedule_id: entry.schedule_id,
                task_type: entry.task_type,
                config_id: entry.config_id,
            })
            .collect()
    }

    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cron_engine::InMemoryCronEngine;
    use serde_json::{json, Map};
    use std::sync::Arc as StdArc;
    use task_core::id::TaskConfigId;
    use task_core::ScheduleConfig;
    use task_registry::Task;

    fn registry_with_reddit_scraper() -> TaskRegistry {
        let registry = TaskRegistry::new();
        registry.register(StdArc::new(test_support::RedditScraper));
        registry
    }

    fn cron_config(id: i64) -> TaskConfig {
        let mut parameters = Map::new();
        parameters.insert("subreddit".to_string(), json!("rust"));
        TaskConfig {
            id: TaskConfigId::new(id),
            name: "hourly scrape".to_string(),
            task_type: "reddit_scraper".to_string(),
            scheduler_type: SchedulerType::Cron,
            parameters,
            schedule_config: ScheduleConfig::Cron {
                cron_expression: "0 0 * * * *".to_string(),
            },
            max_retries: 0,
            timeout_seconds: None,
            priority: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn manual_configs_are_refused() {
        let core = SchedulerCore::new(InMemoryCronEngine::new());
        let registry = registry_with_reddit_scraper();
        let mut config = cron_config(1);
        config.scheduler_type = SchedulerType::Manual;
        config.schedule_config = ScheduleConfig::Manual;
        assert!(core.register(&config, &registry, None).is_err());
    }

    #[test]
    fn unknown_task_type_is_not_found() {
        let core = SchedulerCore::new(InMemoryCronEngine::new());
        let registry = TaskRegistry::new();
        let config = cron_config(1);
        let err = core.register(&config, &registry, None).unwrap_err();
        assert!(matches!(err, TaskError::NotFound { .. }));
    }

    #[test]
    fn missing_required_parameters_fail_validation() {
        let core = SchedulerCore::new(InMemoryCronEngine::new());
        let registry = registry_with_reddit_scraper();
        let mut config = cron_config(1);
        config.parameters = Map::new();
        assert!(core.register(&config, &registry, None).is_err());
    }

    #[test]
    fn register_unregister_roundtrip_and_next_run() {
        let core = SchedulerCore::new(InMemoryCronEngine::new());
        let registry = registry_with_reddit_scraper();
        let config = cron_config(1);
        let schedule_id = core.register(&config, &registry, None).unwrap();
        assert!(core.is_present(&schedule_id));
        assert!(core.next_run_time(&schedule_id).is_some());
        assert_eq!(core.list_all().len(), 1);
        assert!(core.unregister(&schedule_id));
        assert!(!core.is_present(&schedule_id));
        assert!(!core.unregister(&schedule_id));
    }

    #[test]
    fn forced_schedule_id_is_honored() {
        let core = SchedulerCore::new(InMemoryCronEngine::new());
        let registry = registry_with_reddit_scraper();
        let config = cron_config(9);
        let schedule_id = core
            .register(&config, &registry, Some("deadbeefdeadbeef".to_string()))
            .unwrap();
        assert_eq!(schedule_id, "schedule:config:9:deadbeefdeadbeef");
    }

    mod test_support {
        use async_trait::async_trait;
        use serde_json::Value;
        use task_core::TaskResult;
        use task_registry::{ParameterSpec, Task, TaskContext, TypeDescriptor};

        pub struct RedditScraper;

        #[async_trait]
        impl Task for RedditScraper {
            fn name(&self) -> &str {
                "reddit_scraper"
            }
            fn queue(&self) -> &str {
                "scrapers"
            }
            fn parameters(&self) -> Vec<task_registry::ParameterDescriptor> {
                vec![ParameterSpec::new("subreddit", TypeDescriptor::Str).build()]
            }
            async fn execute(&self, _ctx: TaskContext, parameters: Value) -> TaskResult<Value> {
                Ok(parameters)
            }
        }
    }
}
