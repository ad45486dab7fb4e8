//! Read-side shapes the service facade returns. These aggregate across
//! the relational config store, Redis schedule state, and execution
//! stats — none of them are owned by a single lower-layer crate, which
//! is why they live here rather than in `task-core`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use task_core::traits::HealthStatus;
use task_core::{ScheduleStatus, TaskConfig};
use task_registry::TaskInfo;
use task_repository::ExecutionStats;
use task_scheduler::{ScheduleEvent, ScheduleStatusSummary};

/// One live engine entry backing a `TaskConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInstanceView {
    pub schedule_id: String,
    pub status: Option<ScheduleStatus>,
    pub next_run: Option<DateTime<Utc>>,
}

/// The row shape `list_task_configs` returns: a config plus its live
/// schedule instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfigView {
    #[serde(flatten)]
    pub config: TaskConfig,
    pub schedules: Vec<ScheduleInstanceView>,
}

/// The richer shape `get_task_config` returns when asked for a single
/// row — adds recent history and, optionally, execution statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfigDetail {
    #[serde(flatten)]
    pub config: TaskConfig,
    pub schedules: Vec<ScheduleInstanceView>,
    pub recent_history: Vec<ScheduleEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ExecutionStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub total_configs: u64,
    pub registered_task_types: usize,
    pub schedules: ScheduleStatusSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
    pub detail: Option<String>,
}

impl ComponentHealth {
    #[must_use]
    pub fn from_status(name: &str, status: &HealthStatus) -> Self {
        let (healthy, detail) = match status {
            HealthStatus::Healthy => (true, None),
            HealthStatus::Degraded(msg) | HealthStatus::Unhealthy(msg) => (false, Some(msg.clone())),
        };
        Self {
            name: name.to_string(),
            healthy,
            detail,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub overall_healthy: bool,
    pub components: Vec<ComponentHealth>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemDashboard {
    pub status: SystemStatus,
    pub execution_stats_24h: ExecutionStats,
}

/// The system enums output:
/// `{scheduler_types, schedule_actions, task_types, schedule_statuses}`.
/// `task_types` is the one field that isn't a fixed enum — it's
/// populated from the live task registry at call time, so it always
/// reflects whatever `auto_discover` registered.
#[derive(Debug, Clone, Serialize)]
pub struct SystemEnums {
    pub scheduler_types: Vec<&'static str>,
    pub schedule_actions: Vec<&'static str>,
    pub task_types: Vec<String>,
    pub schedule_statuses: Vec<&'static str>,
}

impl SystemEnums {
    #[must_use]
    pub fn new(task_types: Vec<String>) -> Self {
        Self {
            scheduler_types: vec!["MANUAL", "CRON", "DATE"],
            schedule_actions: vec!["register", "pause", "resume", "unregister"],
            task_types,
            schedule_statuses: vec!["INACTIVE", "ACTIVE", "PAUSED", "ERROR"],
        }
    }
}

/// `get_task_info` returns either every registered task type, or a
/// single one scoped by name.
#[derive(Debug, Clone, Serialize)]
pub struct TaskInfoList {
    pub tasks: Vec<TaskInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_cover_every_scheduler_type_and_carry_given_task_types() {
        let enums = SystemEnums::new(vec!["reddit_scraper".to_string()]);
        assert_eq!(enums.scheduler_types.len(), 3);
        assert_eq!(enums.schedule_statuses.len(), 4);
        assert_eq!(enums.schedule_actions.len(), 4);
        assert_eq!(enums.task_types, vec!["reddit_scraper".to_string()]);
    }

    #[test]
    fn component_health_maps_unhealthy_to_detail() {
        let health = ComponentHealth::from_status("redis", &HealthStatus::Unhealthy("ping failed".to_string()));
        assert!(!health.healthy);
        assert_eq!(health.detail.as_deref(), Some("ping failed"));
    }
}
