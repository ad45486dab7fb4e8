//! Shared seams: repository contract, health checks, config lookup.

use crate::model::TaskConfig;
use crate::TaskResult;
use async_trait::async_trait;

#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    async fn find_by_id(&self, id: ID) -> TaskResult<Option<T>>;
    async fn save(&self, entity: T) -> TaskResult<T>;
    async fn delete(&self, id: ID) -> TaskResult<()>;
    async fn exists(&self, id: ID) -> TaskResult<bool>;
}

/// The seam the scheduler uses to read `TaskConfig` rows without
/// depending on the repository crate that owns them. Implemented by
/// `task-repository`'s `TaskConfigRepository`; consumed by
/// `task-scheduler`'s facade for resume and reconciliation.
#[async_trait]
pub trait ConfigLookup: Send + Sync {
    async fn find_config(&self, config_id: i64) -> TaskResult<Option<TaskConfig>>;

    /// Every config whose `scheduler_type` is not `MANUAL` — the
    /// candidate set for `ensure_default_instances` and orphan
    /// detection.
    async fn list_schedulable_configs(&self) -> TaskResult<Vec<TaskConfig>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    async fn check(&self) -> HealthStatus;
}
