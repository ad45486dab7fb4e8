//! Dynamic settings. A single JSON document in Redis holds
//! operator overrides; a compile-time defaults map fills in everything
//! not overridden. An in-memory snapshot makes `cached()` reads O(1) and
//! lock-protected, refreshed on every mutation and on an explicit
//! `refresh()`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use task_core::{TaskError, TaskResult};
use task_redis::{RedisKeys, RedisOps};
use tracing::{info, warn};

/// Sidecar metadata persisted alongside the overrides document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsMeta {
    pub updated_at: DateTime<Utc>,
    pub updated_keys: Vec<String>,
}

/// The defaults a freshly-deployed platform starts with, before any
/// operator override. This is the single source of truth for which
/// keys `update()` will accept.
pub trait DefaultsLoader: Send + Sync {
    fn defaults(&self) -> Map<String, Value>;
}

/// A `DefaultsLoader` built from a fixed map, for tests and for
/// deployments that don't need a pluggable source.
#[derive(Clone)]
pub struct StaticDefaults(pub Map<String, Value>);

impl DefaultsLoader for StaticDefaults {
    fn defaults(&self) -> Map<String, Value> {
        self.0.clone()
    }
}

struct Snapshot {
    effective: Map<String, Value>,
}

pub struct DynamicSettingsService {
    ops: RedisOps,
    keys: Arc<RedisKeys>,
    defaults: Arc<dyn DefaultsLoader>,
    snapshot: Arc<RwLock<Snapshot>>,
}

impl DynamicSettingsService {
    pub async fn new(ops: RedisOps, keys: Arc<RedisKeys>, defaults: Arc<dyn DefaultsLoader>) -> Self {
        let service = Self {
            ops,
            keys,
            defaults,
            snapshot: Arc::new(RwLock::new(Snapshot {
                effective: Map::new(),
            })),
        };
        service.refresh().await;
        service
    }

    /// The compile-time defaults, unmerged.
    #[must_use]
    pub fn defaults(&self) -> Map<String, Value> {
        self.defaults.defaults()
    }

    /// Effective map: defaults overlaid with Redis overrides. Updates the
    /// in-memory snapshot as a side effect.
    pub async fn get_all(&self) -> Map<String, Value> {
        let overrides = self.load_overrides().await;
        let effective = Self::merge(self.defaults(), &overrides);
        *self.snapshot.write() = Snapshot {
            effective: effective.clone(),
        };
        effective
    }

    /// In-memory-only read of a single key, falling back to `default` if
    /// the key was never in the snapshot (e.g. before the first
    /// `get_all`/`refresh`).
    #[must_use]
    pub fn cached(&self, key: &str, default: Value) -> Value {
        self.snapshot
            .read()
            .effective
            .get(key)
            .cloned()
            .unwrap_or(default)
    }

    /// Read-modify-write: merges `patch` into the overrides document.
    /// Rejects keys that are not in the defaults map. On success,
    /// refreshes the metadata timestamp and the in-memory snapshot.
    pub async fn update(&self, patch: Map<String, Value>) -> TaskResult<Map<String, Value>> {
        let defaults = self.defaults();
        let unknown: Vec<&String> = patch.keys().filter(|k| !defaults.contains_key(*k)).collect();
        if !unknown.is_empty() {
            return Err(TaskError::validation(format!(
                "unknown dynamic settings key(s): {}",
                unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            )));
        }

        let mut overrides = self.load_overrides().await;
        for (k, v) in &patch {
            overrides.insert(k.clone(), v.clone());
        }

        let doc_key = self.keys.dynamic_settings();
        let ok = self
            .ops
            .set_json(&doc_key, &Value::Object(overrides.clone()), None)
            .await;
        if !ok {
            return Err(TaskError::transient("failed to persist dynamic settings"));
        }

        self.write_meta(patch.keys().cloned().collect()).await;
        let effective = Self::merge(defaults, &overrides);
        *self.snapshot.write() = Snapshot {
            effective: effective.clone(),
        };
        info!(keys = ?patch.keys().collect::<Vec<_>>(), "dynamic settings updated");
        Ok(effective)
    }

    /// Resets specific keys (or, with `None`, the entire overrides
    /// document) back to defaults.
    pub async fn reset(&self, keys: Option<Vec<String>>) -> TaskResult<Map<String, Value>> {
        let doc_key = self.keys.dynamic_settings();
        match keys {
            None => {
                self.ops.delete(&doc_key).await;
                self.write_meta(vec!["*".to_string()]).await;
            }
            Some(keys) => {
                let mut overrides = self.load_overrides().await;
                let removed: HashSet<String> = keys.into_iter().collect();
                overrides.retain(|k, _| !removed.contains(k));
                let ok = self
                    .ops
                    .set_json(&doc_key, &Value::Object(overrides), None)
                    .await;
                if !ok {
                    return Err(TaskError::transient("failed to persist dynamic settings reset"));
                }
                self.write_meta(removed.into_iter().collect()).await;
            }
        }
        Ok(self.get_all().await)
    }

    /// Reloads the snapshot from Redis without making any changes.
    pub async fn refresh(&self) -> Map<String, Value> {
        self.get_all().await
    }

    pub async fn meta(&self) -> Option<SettingsMeta> {
        self.ops.get_json(&self.keys.dynamic_settings_meta()).await
    }

    async fn load_overrides(&self) -> Map<String, Value> {
        match self.ops.get_json::<Value>(&self.keys.dynamic_settings()).await {
            Some(Value::Object(map)) => map,
            Some(_) => {
                warn!("dynamic settings document was not a json object; ignoring");
                Map::new()
            }
            None => Map::new(),
        }
    }

    async fn write_meta(&self, updated_keys: Vec<String>) {
        let meta = SettingsMeta {
            updated_at: Utc::now(),
            updated_keys,
        };
        self.ops
            .set_json(&self.keys.dynamic_settings_meta(), &meta, None)
            .await;
    }

    fn merge(mut defaults: Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
        for (k, v) in overrides {
            defaults.insert(k.clone(), v.clone());
        }
        defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use task_config::RedisConfig;
    use task_redis::RedisConnectionManager;

    fn unreachable_ops() -> RedisOps {
        let mut config = RedisConfig::default();
        config.url = "redis://127.0.0.1:1".to_string();
        let manager = RedisConnectionManager::connect(&config).unwrap();
        RedisOps::new(manager)
    }

    fn defaults() -> Arc<dyn DefaultsLoader> {
        let mut map = Map::new();
        map.insert("max_retries".to_string(), serde_json::json!(3));
        map.insert("feature_x_enabled".to_string(), serde_json::json!(false));
        Arc::new(StaticDefaults(map))
    }

    #[tokio::test]
    async fn reads_degrade_to_defaults_on_redis_outage() {
        let service = DynamicSettingsService::new(unreachable_ops(), Arc::new(RedisKeys::new("t")), defaults()).await;
        let effective = service.get_all().await;
        assert_eq!(effective.get("max_retries"), Some(&serde_json::json!(3)));
    }

    #[tokio::test]
    async fn update_rejects_unknown_keys() {
        let service = DynamicSettingsService::new(unreachable_ops(), Arc::new(RedisKeys::new("t")), defaults()).await;
        let mut patch = Map::new();
        patch.insert("not_a_real_setting".to_string(), serde_json::json!(1));
        let result = service.update(patch).await;
        assert!(matches!(result, Err(TaskError::Validation(_))));
    }

    #[tokio::test]
    async fn update_on_redis_outage_is_transient_error() {
        let service = DynamicSettingsService::new(unreachable_ops(), Arc::new(RedisKeys::new("t")), defaults()).await;
        let mut patch = Map::new();
        patch.insert("max_retries".to_string(), serde_json::json!(5));
        let result = service.update(patch).await;
        assert!(matches!(result, Err(TaskError::Transient(_))));
    }

    #[tokio::test]
    async fn cached_falls_back_to_supplied_default_before_any_snapshot() {
        let ops = unreachable_ops();
        let service = DynamicSettingsService {
            ops,
            keys: Arc::new(RedisKeys::new("t")),
            defaults: defaults(),
            snapshot: Arc::new(RwLock::new(Snapshot { effective: Map::new() })),
        };
        assert_eq!(service.cached("max_retries", serde_json::json!(99)), serde_json::json!(99));
    }
}
