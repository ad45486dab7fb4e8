//! Manual dependency wiring for the platform binary.
//!
//! This workspace composes its components by hand rather than through
//! a DI container (see `task-repository::pool`'s doc comment) — this
//! module is the one place that decision is paid for: every
//! constructor call for every crate in the workspace happens here,
//! once, at startup.

use std::sync::Arc;

use serde_json::{json, Map};
use task_cache::CacheEngine;
use task_config::AppConfig;
use task_core::traits::{ConfigLookup, HealthCheck};
use task_core::TaskResult;
use task_redis::{RedisConnectionManager, RedisKeys, RedisOps};
use task_registry::TaskRegistry;
use task_repository::{DatabasePool, ExecutionRepository, TaskConfigRepository};
use task_scheduler::{InMemoryCronEngine, ScheduleStateStore, SchedulerCore, SchedulerFacade};
use task_service::TaskServiceFacade;
use task_settings::{DynamicSettingsService, StaticDefaults};

use crate::tasks::register_default_tasks;

/// Everything `main` needs to run the platform: the API-facing
/// facade, the background loop's own handle on execution history, and
/// the pool it must close on shutdown.
pub struct Platform {
    pub config: AppConfig,
    pub service: Arc<TaskServiceFacade<InMemoryCronEngine>>,
    pub scheduler: Arc<SchedulerFacade<InMemoryCronEngine>>,
    pub execution_repo: Arc<ExecutionRepository>,
    pub db_pool: DatabasePool,
    pub settings: Arc<DynamicSettingsService>,
}

impl Platform {
    pub async fn build(config: AppConfig) -> TaskResult<Self> {
        let db_pool = DatabasePool::connect(&config.database).await?;
        let redis_manager = RedisConnectionManager::connect(&config.redis)?;
        let redis_keys = Arc::new(RedisKeys::new(config.redis.key_prefix.clone()));
        let redis_ops = RedisOps::new(redis_manager.clone());

        let cache = CacheEngine::new(redis_ops.clone(), redis_keys.clone(), config.cache.clone());

        let settings_defaults: Arc<dyn task_settings::DefaultsLoader> = Arc::new(StaticDefaults(platform_defaults()));
        let settings = Arc::new(DynamicSettingsService::new(redis_ops.clone(), redis_keys.clone(), settings_defaults).await);

        let registry = Arc::new(TaskRegistry::new());
        registry.auto_discover(&[register_default_tasks]);

        let config_lookup: Arc<dyn ConfigLookup> = Arc::new(TaskConfigRepository::new(db_pool.clone()));
        let scheduler_core = SchedulerCore::new(InMemoryCronEngine::new());
        let state_store = ScheduleStateStore::new(redis_ops.clone(), redis_keys.clone());
        let scheduler = Arc::new(SchedulerFacade::new(scheduler_core, state_store, registry.clone(), config_lookup));

        let execution_repo = Arc::new(ExecutionRepository::new(db_pool.clone()));

        let health_checks: Vec<Arc<dyn HealthCheck>> = vec![Arc::new(db_pool.clone()), Arc::new(redis_manager)];

        let service = Arc::new(TaskServiceFacade::new(
            TaskConfigRepository::new(db_pool.clone()),
            ExecutionRepository::new(db_pool.clone()),
            scheduler.clone(),
            cache,
            registry,
            health_checks,
        ));

        Ok(Self {
            config,
            service,
            scheduler,
            execution_repo,
            db_pool,
            settings,
        })
    }
}

/// Compile-time defaults for the dynamic settings document, seeded
/// with the knobs the platform itself reads back via
/// `DynamicSettingsService::cached`.
fn platform_defaults() -> Map<String, serde_json::Value> {
    let mut defaults = Map::new();
    defaults.insert("orphan_cleanup_enabled".to_string(), json!(true));
    defaults.insert("max_retries_default".to_string(), json!(3));
    defaults.insert("stats_window_days_default".to_string(), json!(7));
    defaults
}
