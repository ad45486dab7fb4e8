//! The persistent data model shared by the repository layer (which owns
//! it in the relational store) and the scheduler (which reads it to
//! build/rebuild live schedule instances). Living here, rather than in
//! either of those crates, is what lets the scheduler depend on the
//! model without depending on the repository implementation.

use crate::id::TaskConfigId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchedulerType {
    Manual,
    Cron,
    Date,
}

impl SchedulerType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Cron => "CRON",
            Self::Date => "DATE",
        }
    }
}

impl std::fmt::Display for SchedulerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The scheduling rule attached to a `TaskConfig`. Shape must match
/// `scheduler_type`; enforced by `TaskConfig::validate_schedule_shape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleConfig {
    Manual,
    Cron { cron_expression: String },
    /// Always UTC — no timezone conversion is performed anywhere in
    /// the scheduler (see DESIGN.md).
    Date { run_at: DateTime<Utc> },
}

impl ScheduleConfig {
    #[must_use]
    pub fn scheduler_type(&self) -> SchedulerType {
        match self {
            Self::Manual => SchedulerType::Manual,
            Self::Cron { .. } => SchedulerType::Cron,
            Self::Date { .. } => SchedulerType::Date,
        }
    }

    #[must_use]
    pub fn matches(&self, scheduler_type: SchedulerType) -> bool {
        self.scheduler_type() == scheduler_type
    }
}

/// A persistent task configuration: one parameterization of a
/// registered task type, plus its scheduling rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub id: TaskConfigId,
    pub name: String,
    pub task_type: String,
    pub scheduler_type: SchedulerType,
    pub parameters: Map<String, Value>,
    pub schedule_config: ScheduleConfig,
    pub max_retries: i32,
    pub timeout_seconds: Option<i64>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskConfig {
    /// Enforces the `schedule_config` ↔ `scheduler_type` shape
    /// invariant.
    pub fn validate_schedule_shape(&self) -> Result<(), crate::TaskError> {
        if self.schedule_config.matches(self.scheduler_type) {
            Ok(())
        } else {
            Err(crate::TaskError::validation(format!(
                "schedule_config shape does not match scheduler_type {}",
                self.scheduler_type
            )))
        }
    }
}

/// One fired execution of a schedule instance. Never mutated after
/// insert; purged only by retention policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecution {
    pub id: crate::id::ExecutionId,
    /// Id assigned by the cron engine at fire time (distinct from
    /// `schedule_id` — many executions share one schedule_id over time).
    pub task_id: String,
    pub config_id: Option<TaskConfigId>,
    pub is_success: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub error_traceback: Option<String>,
}

/// The live-schedule status enum: a `ScheduleInstance`'s status and
/// the lifecycle state machine's states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScheduleStatus {
    Inactive,
    Active,
    Paused,
    Error,
}

impl ScheduleStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = crate::TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INACTIVE" => Ok(Self::Inactive),
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "ERROR" => Ok(Self::Error),
            other => Err(crate::TaskError::internal(format!("unknown schedule status `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_shape_must_match_scheduler_type() {
        let mut config = sample_config();
        config.scheduler_type = SchedulerType::Cron;
        config.schedule_config = ScheduleConfig::Manual;
        assert!(config.validate_schedule_shape().is_err());

        config.schedule_config = ScheduleConfig::Cron {
            cron_expression: "0 * * * *".to_string(),
        };
        assert!(config.validate_schedule_shape().is_ok());
    }

    #[test]
    fn status_round_trips_through_display_and_parse() {
        for status in [
            ScheduleStatus::Inactive,
            ScheduleStatus::Active,
            ScheduleStatus::Paused,
            ScheduleStatus::Error,
        ] {
            let parsed: ScheduleStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    fn sample_config() -> TaskConfig {
        TaskConfig {
            id: TaskConfigId::new(1),
            name: "test".to_string(),
            task_type: "reddit_scraper".to_string(),
            scheduler_type: SchedulerType::Manual,
            parameters: Map::new(),
            schedule_config: ScheduleConfig::Manual,
            max_retries: 0,
            timeout_seconds: None,
            priority: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
