//! The scheduler facade. Owns the register → pause/resume
//! → unregister lifecycle state machine and the reconciliation passes
//! that keep the live cron table consistent with the relational store
//! it was built from.

use crate::cron_engine::CronEngine;
use crate::lock_pool::LockPool;
use crate::scheduler_core::SchedulerCore;
use crate::state_store::{ScheduleMeta, ScheduleStateStore};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use task_core::{ConfigLookup, ScheduleStatus, TaskError, TaskResult};
use task_redis::RedisKeys;
use task_registry::TaskRegistry;
use tracing::{info, warn};

/// One engine-resident schedule whose `config_id` no longer resolves
/// to a row in the relational store.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrphanSchedule {
    pub schedule_id: String,
    pub config_id: i64,
    pub task_type: String,
}

pub struct SchedulerFacade<E: CronEngine> {
    core: SchedulerCore<E>,
    store: ScheduleStateStore,
    registry: Arc<TaskRegistry>,
    config_lookup: Arc<dyn ConfigLookup>,
    locks: LockPool,
}

impl<E: CronEngine> SchedulerFacade<E> {
    #[must_use]
    pub fn new(core: SchedulerCore<E>, store: ScheduleStateStore, registry: Arc<TaskRegistry>, config_lookup: Arc<dyn ConfigLookup>) -> Self {
        Self {
            core,
            store,
            registry,
            config_lookup,
            locks: LockPool::new(),
        }
    }

    #[must_use]
    pub fn scheduler_core(&self) -> &SchedulerCore<E> {
        &self.core
    }

    #[must_use]
    pub fn state_store(&self) -> &ScheduleStateStore {
        &self.store
    }

    /// ⊥ → ACTIVE. Builds a live cron-table entry for `config` and
    /// records its index/meta/status/history. Rolls the cron-table
    /// entry back if any of the Redis writes after it fail, so a
    /// partial registration never leaves a schedule live with no
    /// recoverable metadata.
    pub async fn register_config(&self, config: &task_core::TaskConfig) -> TaskResult<String> {
        let _guard = self.locks.lock(&format!("config:{}", config.id)).await;
        let schedule_id = self.core.register(config, &self.registry, None)?;

        let meta = ScheduleMeta {
            config_id: config.id.into_inner(),
            task_type: config.task_type.clone(),
            registered_at: Utc::now(),
        };
        let persisted = self.store.register_artifacts(config.id.into_inner(), &schedule_id, &meta).await;

        if !persisted {
            self.core.unregister(&schedule_id);
            self.store.remove_from_index(config.id.into_inner(), &schedule_id).await;
            self.store.purge_artifacts(&schedule_id).await;
            return Err(TaskError::transient(format!(
                "failed to persist schedule state for {schedule_id}, registration rolled back"
            )));
        }

        info!(schedule_id = %schedule_id, config_id = %config.id, "schedule registered");
        Ok(schedule_id)
    }

    /// ACTIVE|PAUSED|ERROR → ⊥. Idempotent: unregistering a
    /// `schedule_id` with no live entry and no artifacts is not an
    /// error.
    pub async fn unregister(&self, schedule_id: &str) -> TaskResult<()> {
        let _guard = self.locks.lock(schedule_id).await;
        let config_id = self.resolve_config_id(schedule_id).await;

        self.core.unregister(schedule_id);
        if let Some(config_id) = config_id {
            self.store.remove_from_index(config_id, schedule_id).await;
        }
        self.store.purge_artifacts(schedule_id).await;
        self.store.add_event(schedule_id, "task_unregistered", None).await;
        info!(schedule_id, "schedule unregistered");
        Ok(())
    }

    /// ACTIVE → PAUSED. Refuses any other starting state.
    pub async fn pause(&self, schedule_id: &str) -> TaskResult<()> {
        let _guard = self.locks.lock(schedule_id).await;
        let status = self.store.get_status(schedule_id).await;
        if status != Some(ScheduleStatus::Active) {
            return Err(TaskError::conflict(format!(
                "cannot pause schedule {schedule_id} from state {status:?}, expected ACTIVE"
            )));
        }
        self.core.unregister(schedule_id);
        self.store.set_status(schedule_id, ScheduleStatus::Paused).await;
        self.store.add_event(schedule_id, "status_changed", Some(json!({"to": "PAUSED"}))).await;
        Ok(())
    }

    /// PAUSED|ERROR → ACTIVE. Reloads the config fresh from the
    /// relational store rather than trusting the cached meta snapshot —
    /// the config may have been edited while paused.
    pub async fn resume(&self, schedule_id: &str) -> TaskResult<()> {
        let _guard = self.locks.lock(schedule_id).await;
        let status = self.store.get_status(schedule_id).await;
        if !matches!(status, Some(ScheduleStatus::Paused) | Some(ScheduleStatus::Error)) {
            return Err(TaskError::conflict(format!(
                "cannot resume schedule {schedule_id} from state {status:?}, expected PAUSED or ERROR"
            )));
        }

        let config_id = self
            .resolve_config_id(schedule_id)
            .await
            .ok_or_else(|| TaskError::integrity(format!("schedule {schedule_id} has no recoverable config_id")))?;
        let config = self
            .config_lookup
            .find_config(config_id)
            .await?
            .ok_or_else(|| TaskError::not_found("task_config", config_id))?;

        self.core.register(&config, &self.registry, Some(schedule_id_suffix(schedule_id)))?;
        self.store.set_status(schedule_id, ScheduleStatus::Active).await;
        self.store.add_event(schedule_id, "status_changed", Some(json!({"to": "ACTIVE"}))).await;
        Ok(())
    }

    /// Live cron-table entries whose `config_id` no longer resolves in
    /// the relational store.
    pub async fn find_orphans(&self) -> TaskResult<Vec<OrphanSchedule>> {
        let mut orphans = Vec::new();
        for entry in self.core.list_all() {
            if self.config_lookup.find_config(entry.config_id).await?.is_none() {
                orphans.push(OrphanSchedule {
                    schedule_id: entry.schedule_id,
                    config_id: entry.config_id,
                    task_type: entry.task_type,
                });
            }
        }
        Ok(orphans)
    }

    /// Unregisters every orphan found by [`Self::find_orphans`].
    /// Returns the number removed.
    pub async fn cleanup_orphans(&self) -> TaskResult<u64> {
        let orphans = self.find_orphans().await?;
        let mut removed = 0u64;
        for orphan in orphans {
            warn!(schedule_id = %orphan.schedule_id, config_id = orphan.config_id, "removing orphaned schedule");
            self.unregister(&orphan.schedule_id).await?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Registers every schedulable config that has no live instance
    /// yet — run at startup so a restart rebuilds the cron table from
    /// the relational store rather than starting empty.
    pub async fn ensure_default_instances(&self) -> TaskResult<u64> {
        let mut created = 0u64;
        for config in self.config_lookup.list_schedulable_configs().await? {
            if !self.store.list_ids(config.id.into_inner()).await.is_empty() {
                continue;
            }
            self.register_config(&config).await?;
            created += 1;
        }
        Ok(created)
    }

    /// Deletes keys left by a prior, now-legacy scheduler deployment.
    /// The pattern is configurable (see `DESIGN.md`), defaulting to
    /// `btu_scheduler:*`.
    pub async fn cleanup_legacy_artifacts(&self, legacy_pattern: &str) -> u64 {
        self.store.cleanup_legacy_keys(legacy_pattern).await
    }

    async fn resolve_config_id(&self, schedule_id: &str) -> Option<i64> {
        if let Some(meta) = self.store.get_meta(schedule_id).await {
            return Some(meta.config_id);
        }
        RedisKeys::parse_config_id(schedule_id)
    }
}

fn schedule_id_suffix(schedule_id: &str) -> String {
    schedule_id.rsplit(':').next().unwrap_or(schedule_id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cron_engine::InMemoryCronEngine;
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use task_core::id::TaskConfigId;
    use task_core::{ScheduleConfig, SchedulerType, TaskConfig};
    use task_registry::{ParameterSpec, Task, TaskContext, TypeDescriptor};

    struct RedditScraper;

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
        async fn execute(&self, _ctx: TaskContext, parameters: serde_json::Value) -> TaskResult<serde_json::Value> {
            Ok(parameters)
        }
    }

    struct FakeConfigLookup {
        configs: parking_lot::Mutex<Vec<TaskConfig>>,
    }

    #[async_trait]
    impl ConfigLookup for FakeConfigLookup {
        async fn find_config(&self, config_id: i64) -> TaskResult<Option<TaskConfig>> {
            Ok(self.configs.lock().iter().find(|c| c.id.into_inner() == config_id).cloned())
        }
        async fn list_schedulable_configs(&self) -> TaskResult<Vec<TaskConfig>> {
            Ok(self.configs.lock().iter().filter(|c| c.scheduler_type != SchedulerType::Manual).cloned().collect())
        }
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

    fn test_facade(configs: Vec<TaskConfig>) -> SchedulerFacade<InMemoryCronEngine> {
        let registry = Arc::new(TaskRegistry::new());
        registry.register(Arc::new(RedditScraper));
        let core = SchedulerCore::new(InMemoryCronEngine::new());
        let mut redis_config = task_config::RedisConfig::default();
        redis_config.url = "redis://127.0.0.1:1".to_string();
        let manager = task_redis::RedisConnectionManager::connect(&redis_config).unwrap();
        let store = ScheduleStateStore::new(task_redis::RedisOps::new(manager), Arc::new(RedisKeys::new("taskplatform")));
        let lookup = Arc::new(FakeConfigLookup {
            configs: parking_lot::Mutex::new(configs),
        });
        SchedulerFacade::new(core, store, registry, lookup)
    }

    #[tokio::test]
    async fn register_rolls_back_cron_entry_when_redis_is_unreachable() {
        let facade = test_facade(vec![cron_config(1)]);
        let err = facade.register_config(&cron_config(1)).await.unwrap_err();
        assert!(matches!(err, TaskError::Transient(_)));
        assert!(facade.scheduler_core().list_all().is_empty());
    }

    #[tokio::test]
    async fn pause_without_prior_active_status_is_conflict() {
        let facade = test_facade(vec![]);
        let err = facade.pause("schedule:config:1:abcd").await.unwrap_err();
        assert!(matches!(err, TaskError::Conflict(_)));
    }

    #[tokio::test]
    async fn resume_without_paused_status_is_conflict() {
        let facade = test_facade(vec![]);
        let err = facade.resume("schedule:config:1:abcd").await.unwrap_err();
        assert!(matches!(err, TaskError::Conflict(_)));
    }

    #[tokio::test]
    async fn unregister_is_idempotent_with_no_live_entry() {
        let facade = test_facade(vec![]);
        assert!(facade.unregister("schedule:config:1:abcd").await.is_ok());
    }
}
