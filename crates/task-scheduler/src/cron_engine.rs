//! The underlying cron/date engine the scheduler core sits on top of —
//! an in-process table of live schedule rules, generalized from
//! `arcana-jobs::scheduler::Scheduler` (`jobs:
//! Arc<RwLock<HashMap<String, ScheduledJob>>>`) into a trait so a
//! future distributed engine could back the same facade.

use chrono::{DateTime, Utc};
use cron::Schedule;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use task_core::{TaskError, TaskResult};

/// The scheduling rule attached to one live entry. `Date` rules fire
/// once and are naturally exhausted once `run_at` passes.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleRule {
    Cron(String),
    Date(DateTime<Utc>),
}

/// One live, engine-resident schedule. Everything the facade needs to
/// recompute a next-run time or describe the entry back to a caller.
#[derive(Debug, Clone)]
pub struct CronEntry {
    pub schedule_id: String,
    pub task_type: String,
    pub config_id: i64,
    pub rule: ScheduleRule,
}

impl CronEntry {
    /// Computes the next fire time from `from`, or `None` if the rule
    /// can never fire again (an exhausted `Date` rule, or a `Cron`
    /// expression with no future occurrence).
    #[must_use]
    pub fn next_run_from(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.rule {
            ScheduleRule::Cron(expr) => Schedule::from_str(expr).ok()?.after(&from).next(),
            ScheduleRule::Date(run_at) => (*run_at > from).then_some(*run_at),
        }
    }
}

/// The abstraction the scheduler core depends on instead of a concrete
/// cron table — swappable for a distributed implementation without
/// touching the scheduler facade.
pub trait CronEngine: Send + Sync {
    fn add(&self, entry: CronEntry) -> TaskResult<()>;
    fn remove(&self, schedule_id: &str) -> bool;
    fn get(&self, schedule_id: &str) -> Option<CronEntry>;
    fn contains(&self, schedule_id: &str) -> bool;
    fn list_all(&self) -> Vec<CronEntry>;
}

/// Process-memory cron table. One per worker instance — each scheduler
/// instance owns its own `jobs` map rather than sharing one across a
/// fleet.
#[derive(Clone, Default)]
pub struct InMemoryCronEngine {
    entries: Arc<RwLock<HashMap<String, CronEntry>>>,
}

impl InMemoryCronEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CronEngine for InMemoryCronEngine {
    fn add(&self, entry: CronEntry) -> TaskResult<()> {
        if let ScheduleRule::Cron(expr) = &entry.rule {
            Schedule::from_str(expr)
                .map_err(|e| TaskError::validation(format!("invalid cron expression `{expr}`: {e}")))?;
        }
        self.entries.write().insert(entry.schedule_id.clone(), entry);
        Ok(())
    }

    fn remove(&self, schedule_id: &str) -> bool {
        self.entries.write().remove(schedule_id).is_some()
    }

    fn get(&self, schedule_id: &str) -> Option<CronEntry> {
        self.entries.read().get(schedule_id).cloned()
    }

    fn contains(&self, schedule_id: &str) -> bool {
        self.entries.read().contains_key(schedule_id)
    }

    fn list_all(&self) -> Vec<CronEntry> {
        self.entries.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cron_entry(schedule_id: &str) -> CronEntry {
        CronEntry {
            schedule_id: schedule_id.to_string(),
            task_type: "reddit_scraper".to_string(),
            config_id: 1,
            rule: ScheduleRule::Cron("0 * * * * *".to_string()),
        }
    }

    #[test]
    fn rejects_invalid_cron_expression() {
        let engine = InMemoryCronEngine::new();
        let mut entry = cron_entry("schedule:config:1:a");
        entry.rule = ScheduleRule::Cron("not a cron expression".to_string());
        assert!(engine.add(entry).is_err());
    }

    #[test]
    fn add_remove_roundtrip() {
        let engine = InMemoryCronEngine::new();
        let entry = cron_entry("schedule:config:1:a");
        engine.add(entry).unwrap();
        assert!(engine.contains("schedule:config:1:a"));
        assert!(engine.remove("schedule:config:1:a"));
        assert!(!engine.contains("schedule:config:1:a"));
    }

    #[test]
    fn exhausted_date_rule_has_no_next_run() {
        let entry = CronEntry {
            schedule_id: "schedule:config:2:b".to_string(),
            task_type: "reddit_scraper".to_string(),
            config_id: 2,
            rule: ScheduleRule::Date(DateTime::parse_from_rfc3339("2000-01-01T00:00:00Z").unwrap().into()),
        };
        assert_eq!(entry.next_run_from(Utc::now()), None);
    }

    #[test]
    fn future_date_rule_fires_once() {
        let future = Utc::now() + chrono::Duration::days(1);
        let entry = CronEntry {
            schedule_id: "schedule:config:3:c".to_string(),
            task_type: "reddit_scraper".to_string(),
            config_id: 3,
            rule: ScheduleRule::Date(future),
        };
        assert_eq!(entry.next_run_from(Utc::now()), Some(future));
    }
}
