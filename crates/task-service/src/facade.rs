//! The task service facade. The only API-visible surface;
//! everything else in the workspace is plumbing this orchestrates.
//! Joins the relational config repository, the scheduler lifecycle and
//! its state store, and execution stats behind one struct.

use crate::cache_tags;
use crate::dto::{
    ComponentHealth, ScheduleInstanceView, SystemDashboard, SystemEnums, SystemHealth, SystemStatus, TaskConfigDetail,
    TaskConfigView, TaskInfoList,
};
use crate::metrics::FacadeMetrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use task_cache::envelope::{envelope_for_value, value_from_envelope};
use task_cache::{CacheEnvelope, CacheEngine};
use task_core::traits::HealthCheck;
use task_core::{Page, PageRequest, SchedulerType, TaskConfig, TaskConfigId, TaskError, TaskResult};
use task_registry::TaskRegistry;
use task_repository::{ExecutionRepository, ExecutionStats, OrderDir, OrderField, TaskConfigQuery, TaskConfigRepository};
use task_scheduler::{CronEngine, OrphanSchedule, SchedulerFacade};
use tracing::debug;

pub struct TaskServiceFacade<E: CronEngine> {
    config_repo: TaskConfigRepository,
    execution_repo: ExecutionRepository,
    scheduler: Arc<SchedulerFacade<E>>,
    cache: CacheEngine,
    registry: Arc<TaskRegistry>,
    health_checks: Vec<Arc<dyn HealthCheck>>,
}

impl<E: CronEngine> TaskServiceFacade<E> {
    #[must_use]
    pub fn new(
        config_repo: TaskConfigRepository,
        execution_repo: ExecutionRepository,
        scheduler: Arc<SchedulerFacade<E>>,
        cache: CacheEngine,
        registry: Arc<TaskRegistry>,
        health_checks: Vec<Arc<dyn HealthCheck>>,
    ) -> Self {
        Self {
            config_repo,
            execution_repo,
            scheduler,
            cache,
            registry,
            health_checks,
        }
    }

    /// `get_by_query` rows, each decorated with its live schedule
    /// instances: run the relational query, then for each row attach
    /// live schedule status from the Redis-backed state store.
    pub async fn list_task_configs(&self, query: &TaskConfigQuery) -> TaskResult<Page<TaskConfigView>> {
        FacadeMetrics::record_configs_listed();
        let cache_key = cache_tags::task_configs_key(&query_fingerprint(query));
        if let Some(page) = self.cache_get::<Page<TaskConfigView>>(&cache_key).await {
            FacadeMetrics::record_cache_hit();
            return Ok(page);
        }
        FacadeMetrics::record_cache_miss();

        let page = self.config_repo.get_by_query(query).await?;
        let mut content = Vec::with_capacity(page.content.len());
        for config in page.content {
            let schedules = self.schedule_views(config.id.into_inner()).await;
            content.push(TaskConfigView { config, schedules });
        }
        let result = Page { content, info: page.info };

        self.cache_put(&cache_key, &result, cache_tags::TAG_TASK_CONFIGS).await;
        Ok(result)
    }

    /// The config row plus, optionally, execution stats; always
    /// attaches the state store's recent history as a preview.
    pub async fn get_task_config(&self, id: TaskConfigId, with_stats: bool) -> TaskResult<Option<TaskConfigDetail>> {
        let cache_key = cache_tags::task_config_detail_key(id.into_inner(), with_stats);
        if let Some(detail) = self.cache_get::<TaskConfigDetail>(&cache_key).await {
            FacadeMetrics::record_cache_hit();
            return Ok(Some(detail));
        }
        FacadeMetrics::record_cache_miss();

        let Some(config) = self.config_repo.get(id).await? else {
            return Ok(None);
        };
        let schedules = self.schedule_views(id.into_inner()).await;
        let recent_history = match schedules.first() {
            Some(primary) => self.scheduler.state_store().history(&primary.schedule_id, 20).await,
            None => Vec::new(),
        };
        let stats = if with_stats {
            Some(self.execution_repo.get_stats_by_config(id, 30).await?)
        } else {
            None
        };

        let detail = TaskConfigDetail {
            config,
            schedules,
            recent_history,
            stats,
        };
        self.cache_put(&cache_key, &detail, cache_tags::TAG_TASK_CONFIG_DETAIL).await;
        Ok(Some(detail))
    }

    /// Creates the config row; registers a live schedule when
    /// `auto_schedule` is set and the config is not `MANUAL`.
    pub async fn create_task_config(&self, config: TaskConfig, auto_schedule: bool) -> TaskResult<TaskConfig> {
        let created = self.config_repo.create(&config).await?;
        FacadeMetrics::record_config_created();

        if auto_schedule && created.scheduler_type != SchedulerType::Manual {
            self.scheduler.register_config(&created).await?;
            self.invalidate_schedule_tags().await;
        }
        self.invalidate_config_tags().await;
        Ok(created)
    }

    /// Updates the config row. Does not touch any live schedule
    /// instance — `resume()` is what picks up an edited config.
    pub async fn update_task_config(&self, config: TaskConfig) -> TaskResult<TaskConfig> {
        let updated = self.config_repo.update(&config).await?;
        self.invalidate_config_tags().await;
        Ok(updated)
    }

    /// Lists live schedule ids, unregisters each, then deletes the
    /// config row. Historical executions are detached (`config_id`
    /// set to `NULL`), not deleted — they stay queryable as orphaned
    /// history.
    pub async fn delete_task_config(&self, id: TaskConfigId) -> TaskResult<()> {
        let schedule_ids = self.scheduler.state_store().list_ids(id.into_inner()).await;
        for schedule_id in schedule_ids {
            self.scheduler.unregister(&schedule_id).await?;
        }
        self.execution_repo.clear_config_id(id).await?;
        self.config_repo.delete(id).await?;
        FacadeMetrics::record_config_deleted();

        self.invalidate_config_tags().await;
        self.invalidate_schedule_tags().await;
        Ok(())
    }

    pub async fn get_system_status(&self) -> TaskResult<SystemStatus> {
        let cache_key = cache_tags::system_status_key();
        if let Some(status) = self.cache_get::<SystemStatus>(&cache_key).await {
            return Ok(status);
        }

        let count_query = TaskConfigQuery {
            page: PageRequest::new(0, 1),
            ..TaskConfigQuery::default()
        };
        let total_configs = self.config_repo.get_by_query(&count_query).await?.info.total_elements;
        let schedules = self.scheduler.state_store().status_summary().await;
        FacadeMetrics::record_schedule_breakdown(schedules.active, schedules.paused, schedules.error);

        let status = SystemStatus {
            total_configs,
            registered_task_types: self.registry.len(),
            schedules,
        };
        self.cache_put(&cache_key, &status, cache_tags::TAG_SYSTEM_STATUS).await;
        Ok(status)
    }

    /// Live probe, never cached — a stale health reading defeats its
    /// purpose.
    pub async fn get_system_health(&self) -> SystemHealth {
        let mut components = Vec::with_capacity(self.health_checks.len());
        let mut overall_healthy = true;
        for check in &self.health_checks {
            let status = check.check().await;
            overall_healthy &= status.is_healthy();
            components.push(ComponentHealth::from_status(check.name(), &status));
        }
        SystemHealth {
            overall_healthy,
            components,
        }
    }

    pub async fn get_system_dashboard(&self, stats_window_days: i64) -> TaskResult<SystemDashboard> {
        let status = self.get_system_status().await?;
        let execution_stats_24h: ExecutionStats = self.execution_repo.get_global_stats(stats_window_days).await?;
        Ok(SystemDashboard {
            status,
            execution_stats_24h,
        })
    }

    #[must_use]
    pub fn get_system_enums(&self) -> SystemEnums {
        let task_types = self.registry.list_all().into_iter().map(|t| t.name).collect();
        SystemEnums::new(task_types)
    }

    /// Every registered task's info, or just `task_type`'s if given.
    pub fn get_task_info(&self, task_type: Option<&str>) -> TaskResult<TaskInfoList> {
        match task_type {
            Some(name) => {
                if !self.registry.is_registered(name) {
                    return Err(TaskError::not_found("task_type", name));
                }
                let tasks = self.registry.list_all().into_iter().filter(|t| t.name == name).collect();
                Ok(TaskInfoList { tasks })
            }
            None => Ok(TaskInfoList {
                tasks: self.registry.list_all(),
            }),
        }
    }

    pub async fn list_orphans(&self) -> TaskResult<Vec<OrphanSchedule>> {
        let orphans = self.scheduler.find_orphans().await?;
        FacadeMetrics::record_orphans_found(orphans.len() as u64);
        Ok(orphans)
    }

    pub async fn cleanup_orphans(&self) -> TaskResult<u64> {
        let removed = self.scheduler.cleanup_orphans().await?;
        FacadeMetrics::record_orphans_cleaned(removed);
        if removed > 0 {
            self.invalidate_schedule_tags().await;
        }
        Ok(removed)
    }

    pub async fn cleanup_legacy(&self, legacy_pattern: &str) -> u64 {
        self.scheduler.cleanup_legacy_artifacts(legacy_pattern).await
    }

    async fn schedule_views(&self, config_id: i64) -> Vec<ScheduleInstanceView> {
        let ids = self.scheduler.state_store().list_ids(config_id).await;
        let mut views = Vec::with_capacity(ids.len());
        for schedule_id in ids {
            let status = self.scheduler.state_store().get_status(&schedule_id).await;
            let next_run = self.scheduler.scheduler_core().next_run_time(&schedule_id);
            views.push(ScheduleInstanceView {
                schedule_id,
                status,
                next_run,
            });
        }
        views
    }

    async fn invalidate_config_tags(&self) {
        let removed = self
            .cache
            .invalidate_tags(&[
                cache_tags::TAG_TASK_CONFIGS.to_string(),
                cache_tags::TAG_TASK_CONFIG_DETAIL.to_string(),
                cache_tags::TAG_SYSTEM_STATUS.to_string(),
            ])
            .await;
        debug!(removed, "invalidated task config cache tags");
    }

    async fn invalidate_schedule_tags(&self) {
        let removed = self
            .cache
            .invalidate_tags(&[
                cache_tags::TAG_SCHEDULE_LIST.to_string(),
                cache_tags::TAG_SYSTEM_STATUS.to_string(),
            ])
            .await;
        debug!(removed, "invalidated schedule cache tags");
    }

    async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.cache.get(key).await?;
        let envelope = CacheEnvelope::from_bytes(&bytes).ok()?;
        value_from_envelope(&envelope).ok()
    }

    async fn cache_put<T: Serialize>(&self, key: &str, value: &T, tag: &str) {
        let Ok(envelope) = envelope_for_value(value) else {
            return;
        };
        let Ok(bytes) = envelope.to_bytes() else {
            return;
        };
        if self.cache.set(key, &bytes, None).await {
            self.cache.tag(key, tag).await;
        }
    }
}

/// A stable string fingerprint of a query's filter/sort/page shape, used
/// as the cache key's variable component. Two queries with the same
/// fingerprint are guaranteed to produce the same result set.
fn query_fingerprint(query: &TaskConfigQuery) -> String {
    format!(
        "{}|{}|{}|{:?}|{:?}|{}|{}",
        query.name_search.as_deref().unwrap_or(""),
        query.task_type.as_deref().unwrap_or(""),
        query.scheduler_type.map_or("", SchedulerType::as_str),
        order_field_tag(query.order_by),
        order_dir_tag(query.order_dir),
        query.page.page,
        query.page.size,
    )
}

const fn order_field_tag(field: OrderField) -> &'static str {
    match field {
        OrderField::Name => "name",
        OrderField::TaskType => "task_type",
        OrderField::SchedulerType => "scheduler_type",
        OrderField::CreatedAt => "created_at",
        OrderField::UpdatedAt => "updated_at",
        OrderField::Priority => "priority",
    }
}

const fn order_dir_tag(dir: OrderDir) -> &'static str {
    match dir {
        OrderDir::Asc => "asc",
        OrderDir::Desc => "desc",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_for_equivalent_queries() {
        let a = TaskConfigQuery::default();
        let b = TaskConfigQuery::default();
        assert_eq!(query_fingerprint(&a), query_fingerprint(&b));
    }

    #[test]
    fn fingerprint_differs_when_name_search_differs() {
        let mut a = TaskConfigQuery::default();
        a.name_search = Some("reddit".to_string());
        let b = TaskConfigQuery::default();
        assert_ne!(query_fingerprint(&a), query_fingerprint(&b));
    }

    #[test]
    fn fingerprint_differs_across_pages() {
        let mut a = TaskConfigQuery::default();
        a.page = PageRequest::new(1, 20);
        let b = TaskConfigQuery::default();
        assert_ne!(query_fingerprint(&a), query_fingerprint(&b));
    }
}
