//! The schedule state store. Everything the facade needs
//! to persist about a live schedule beyond what the in-process cron
//! table holds — status, metadata, and a bounded event history —
//! lives in Redis under `RedisKeys`' `schedule:*` namespace.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use task_core::{ScheduleStatus, TaskResult};
use task_redis::{RedisKeys, RedisOps};

const MAX_HISTORY_ENTRIES: isize = 100;
const META_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScheduleMeta {
    pub config_id: i64,
    pub task_type: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScheduleEvent {
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ScheduleFullInfo {
    pub status: Option<ScheduleStatus>,
    pub meta: Option<ScheduleMeta>,
    pub history: Vec<ScheduleEvent>,
}

/// Per-status-value tally, the shape the system dashboard renders as
/// a breakdown.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ScheduleStatusSummary {
    pub active: u64,
    pub paused: u64,
    pub error: u64,
    pub inactive: u64,
    pub total: u64,
}

pub struct ScheduleStateStore {
    ops: RedisOps,
    keys: Arc<RedisKeys>,
}

impl ScheduleStateStore {
    #[must_use]
    pub fn new(ops: RedisOps, keys: Arc<RedisKeys>) -> Self {
        Self { ops, keys }
    }

    pub async fn add_to_index(&self, config_id: i64, schedule_id: &str) -> bool {
        self.ops.set_add(&self.keys.schedule_index(config_id), schedule_id).await
    }

    pub async fn remove_from_index(&self, config_id: i64, schedule_id: &str) -> bool {
        self.ops.set_remove(&self.keys.schedule_index(config_id), schedule_id).await
    }

    pub async fn list_ids(&self, config_id: i64) -> Vec<String> {
        self.ops.set_members(&self.keys.schedule_index(config_id)).await
    }

    pub async fn set_status(&self, schedule_id: &str, status: ScheduleStatus) -> bool {
        self.ops
            .set_string(&self.keys.schedule_status(schedule_id), status.as_str(), None)
            .await
    }

    /// Registration's composite write: index membership, the metadata
    /// snapshot, the initial `task_registered` event, and the ACTIVE
    /// status all move together in one MULTI/EXEC round trip rather
    /// than four separate ones.
    pub async fn register_artifacts(&self, config_id: i64, schedule_id: &str, meta: &ScheduleMeta) -> bool {
        let Ok(meta_json) = serde_json::to_string(meta) else {
            return false;
        };
        let event = ScheduleEvent {
            event_type: "task_registered".to_string(),
            timestamp: Utc::now(),
            data: None,
        };
        let Ok(event_json) = serde_json::to_string(&event) else {
            return false;
        };

        let index_key = self.keys.schedule_index(config_id);
        let meta_key = self.keys.schedule_meta(schedule_id);
        let status_key = self.keys.schedule_status(schedule_id);
        let history_key = self.keys.schedule_history(schedule_id);

        self.ops
            .pipeline(|pipe| {
                pipe.sadd(&index_key, schedule_id)
                    .ignore()
                    .set_ex(&meta_key, &meta_json, META_TTL_SECS)
                    .ignore()
                    .set(&status_key, ScheduleStatus::Active.as_str())
                    .ignore()
                    .lpush(&history_key, &event_json)
                    .ignore()
                    .ltrim(&history_key, 0, MAX_HISTORY_ENTRIES - 1)
                    .ignore()
                    .expire(&history_key, META_TTL_SECS as i64)
                    .ignore();
            })
            .await
    }

    pub async fn get_status(&self, schedule_id: &str) -> Option<ScheduleStatus> {
        let raw = self.ops.get_string(&self.keys.schedule_status(schedule_id)).await?;
        raw.parse().ok()
    }

    pub async fn set_meta(&self, schedule_id: &str, meta: &ScheduleMeta) -> bool {
        self.ops
            .set_json(&self.keys.schedule_meta(schedule_id), meta, Some(META_TTL_SECS))
            .await
    }

    pub async fn get_meta(&self, schedule_id: &str) -> Option<ScheduleMeta> {
        self.ops.get_json(&self.keys.schedule_meta(schedule_id)).await
    }

    /// Appends one history event, trimmed to the most recent
    /// `MAX_HISTORY_ENTRIES` and refreshed to the same TTL as the meta
    /// document, so a schedule's artifacts expire together.
    pub async fn add_event(&self, schedule_id: &str, event_type: impl Into<String>, data: Option<Value>) -> bool {
        let event = ScheduleEvent {
            event_type: event_type.into(),
            timestamp: Utc::now(),
            data,
        };
        let Ok(raw) = serde_json::to_string(&event) else {
            return false;
        };
        let key = self.keys.schedule_history(schedule_id);
        let pushed = self.ops.list_push_front(&key, &raw).await;
        if pushed {
            self.ops.list_trim(&key, 0, MAX_HISTORY_ENTRIES - 1).await;
            self.ops.expire(&key, META_TTL_SECS as i64).await;
        }
        pushed
    }

    pub async fn history(&self, schedule_id: &str, limit: isize) -> Vec<ScheduleEvent> {
        self.ops
            .list_range(&self.keys.schedule_history(schedule_id), 0, limit.saturating_sub(1).max(0))
            .await
            .iter()
            .filter_map(|raw| serde_json::from_str(raw).ok())
            .collect()
    }

    pub async fn full_info(&self, schedule_id: &str, history_limit: isize) -> ScheduleFullInfo {
        ScheduleFullInfo {
            status: self.get_status(schedule_id).await,
            meta: self.get_meta(schedule_id).await,
            history: self.history(schedule_id, history_limit).await,
        }
    }

    /// Removes every artifact for `schedule_id` (status, meta, history).
    /// Tolerates partial/missing artifacts — each deletion is
    /// independently safe to no-op.
    pub async fn purge_artifacts(&self, schedule_id: &str) {
        self.ops.delete(&self.keys.schedule_status(schedule_id)).await;
        self.ops.delete(&self.keys.schedule_meta(schedule_id)).await;
        self.ops.delete(&self.keys.schedule_history(schedule_id)).await;
    }

    /// Tallies every `schedule:status:*` key by its stored value. Used
    /// for the system dashboard's schedule breakdown.
    pub async fn status_summary(&self) -> ScheduleStatusSummary {
        let keys = self.ops.scan_keys(&self.keys.schedule_status_glob()).await;
        let mut summary = ScheduleStatusSummary::default();
        for key in &keys {
            let Some(raw) = self.ops.get_string(key).await else {
                continue;
            };
            match raw.parse::<ScheduleStatus>() {
                Ok(ScheduleStatus::Active) => summary.active += 1,
                Ok(ScheduleStatus::Paused) => summary.paused += 1,
                Ok(ScheduleStatus::Error) => summary.error += 1,
                Ok(ScheduleStatus::Inactive) => summary.inactive += 1,
                Err(_) => continue,
            }
            summary.total += 1;
        }
        summary
    }

    /// Deletes every key matching `pattern` via `SCAN`+`DEL`. Used by
    /// the facade's legacy-artifact cleanup against a prior
    /// deployment's key namespace.
    pub async fn cleanup_legacy_keys(&self, pattern: &str) -> u64 {
        self.ops.scan_delete(pattern).await
    }

    pub(crate) fn ops(&self) -> &RedisOps {
        &self.ops
    }
}

impl Clone for ScheduleStateStore {
    fn clone(&self) -> Self {
        Self {
            ops: self.ops.clone(),
            keys: self.keys.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use task_config::RedisConfig;
    use task_redis::RedisConnectionManager;

    fn unreachable_store() -> ScheduleStateStore {
        let mut config = RedisConfig::default();
        config.url = "redis://127.0.0.1:1".to_string();
        let manager = RedisConnectionManager::connect(&config).expect("pool builds lazily");
        ScheduleStateStore::new(RedisOps::new(manager), Arc::new(RedisKeys::new("taskplatform")))
    }

    #[tokio::test]
    async fn full_info_degrades_gracefully_on_outage() {
        let store = unreachable_store();
        let info = store.full_info("schedule:config:1:abcd", 10).await;
        assert!(info.status.is_none());
        assert!(info.meta.is_none());
        assert!(info.history.is_empty());
    }

    #[tokio::test]
    async fn status_summary_on_outage_is_empty() {
        let store = unreachable_store();
        let summary = store.status_summary().await;
        assert_eq!(summary.total, 0);
    }
}
