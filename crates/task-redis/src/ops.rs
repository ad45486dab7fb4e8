//! Typed base operations over a single key-prefix.
//!
//! Every call here acquires its own connection from the shared pool,
//! performs one Redis round trip (or one pipeline), and translates any
//! transport failure into a logged warning plus a safe default (`None`,
//! `false`, `0`, or an empty collection) rather than propagating the
//! error — callers above this layer treat Redis the way a cache is
//! treated: present when it's present.

use crate::pool::RedisConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Stateless wrapper over the shared pool. Cheap to clone; every
/// component that needs Redis access holds one of these.
#[derive(Clone)]
pub struct RedisOps {
    manager: RedisConnectionManager,
}

impl RedisOps {
    #[must_use]
    pub fn new(manager: RedisConnectionManager) -> Self {
        Self { manager }
    }

    // --- strings ---------------------------------------------------------

    pub async fn get_string(&self, key: &str) -> Option<String> {
        let mut conn = self.manager.connection().await.ok()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "redis GET failed");
                None
            }
        }
    }

    pub async fn set_string(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        let result: redis::RedisResult<()> = match ttl_secs {
            Some(ttl) => conn.set_ex(key, value, ttl).await,
            None => conn.set(key, value).await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "redis SET failed");
                false
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_string(key).await?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "stored value is not valid json for this type");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_string(key, &raw, ttl_secs).await,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize value to json");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        match conn.del::<_, u64>(key).await {
            Ok(n) => n > 0,
            Err(e) => {
                warn!(key, error = %e, "redis DEL failed");
                false
            }
        }
    }

    pub async fn delete_many(&self, keys: &[String]) -> u64 {
        if keys.is_empty() {
            return 0;
        }
        let Ok(mut conn) = self.manager.connection().await else {
            return 0;
        };
        match conn.del::<_, u64>(keys).await {
            Ok(n) => n,
            Err(e) => {
                warn!(count = keys.len(), error = %e, "redis DEL (batch) failed");
                0
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        conn.exists::<_, bool>(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "redis EXISTS failed");
            false
        })
    }

    pub async fn expire(&self, key: &str, ttl_secs: i64) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        conn.expire::<_, bool>(key, ttl_secs).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "redis EXPIRE failed");
            false
        })
    }

    // --- hashes ---------------------------------------------------------

    pub async fn hash_get_all(&self, key: &str) -> HashMap<String, String> {
        let Ok(mut conn) = self.manager.connection().await else {
            return HashMap::new();
        };
        conn.hgetall(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "redis HGETALL failed");
            HashMap::new()
        })
    }

    pub async fn hash_set(&self, key: &str, field: &str, value: &str) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        conn.hset::<_, _, _, ()>(key, field, value).await.is_ok()
    }

    // --- sets ---------------------------------------------------------

    pub async fn set_add(&self, key: &str, member: &str) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        match conn.sadd::<_, _, u64>(key, member).await {
            Ok(_) => true,
            Err(e) => {
                warn!(key, error = %e, "redis SADD failed");
                false
            }
        }
    }

    pub async fn set_remove(&self, key: &str, member: &str) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        match conn.srem::<_, _, u64>(key, member).await {
            Ok(_) => true,
            Err(e) => {
                warn!(key, error = %e, "redis SREM failed");
                false
            }
        }
    }

    pub async fn set_members(&self, key: &str) -> Vec<String> {
        let Ok(mut conn) = self.manager.connection().await else {
            return Vec::new();
        };
        conn.smembers(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "redis SMEMBERS failed");
            Vec::new()
        })
    }

    pub async fn set_is_member(&self, key: &str, member: &str) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        conn.sismember(key, member).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "redis SISMEMBER failed");
            false
        })
    }

    // --- lists ---------------------------------------------------------

    pub async fn list_push_front(&self, key: &str, value: &str) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        match conn.lpush::<_, _, u64>(key, value).await {
            Ok(_) => true,
            Err(e) => {
                warn!(key, error = %e, "redis LPUSH failed");
                false
            }
        }
    }

    pub async fn list_trim(&self, key: &str, start: isize, stop: isize) -> bool {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        conn.ltrim::<_, ()>(key, start, stop).await.is_ok()
    }

    pub async fn list_range(&self, key: &str, start: isize, stop: isize) -> Vec<String> {
        let Ok(mut conn) = self.manager.connection().await else {
            return Vec::new();
        };
        conn.lrange(key, start, stop).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "redis LRANGE failed");
            Vec::new()
        })
    }

    // --- scan ---------------------------------------------------------

    /// Enumerates every key matching `pattern` via `SCAN`, never `KEYS`
    /// (which blocks the server for the full keyspace).
    pub async fn scan_keys(&self, pattern: &str) -> Vec<String> {
        let Ok(mut conn) = self.manager.connection().await else {
            return Vec::new();
        };
        let mut cursor: u64 = 0;
        let mut out = Vec::new();
        loop {
            let result: redis::RedisResult<(u64, Vec<String>)> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut *conn)
                .await;
            match result {
                Ok((next, mut batch)) => {
                    out.append(&mut batch);
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                Err(e) => {
                    warn!(pattern, error = %e, "redis SCAN failed");
                    break;
                }
            }
        }
        out
    }

    pub async fn scan_count(&self, pattern: &str) -> u64 {
        self.scan_keys(pattern).await.len() as u64
    }

    pub async fn scan_delete(&self, pattern: &str) -> u64 {
        let keys = self.scan_keys(pattern).await;
        self.delete_many(&keys).await
    }

    /// Runs a caller-supplied closure against a `MULTI/EXEC` pipeline.
    /// The closure populates the pipeline; this method executes it and
    /// discards the per-command replies (callers that need them should
    /// issue those commands outside the pipeline).
    pub async fn pipeline<F>(&self, build: F) -> bool
    where
        F: FnOnce(&mut redis::Pipeline),
    {
        let Ok(mut conn) = self.manager.connection().await else {
            return false;
        };
        let mut pipe = redis::pipe();
        pipe.atomic();
        build(&mut pipe);
        match pipe.query_async::<_, ()>(&mut *conn).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "redis pipeline failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use task_config::RedisConfig;

    fn unreachable_ops() -> RedisOps {
        let mut config = RedisConfig::default();
        config.url = "redis://127.0.0.1:1".to_string();
        let manager = RedisConnectionManager::connect(&config).expect("pool builds lazily");
        RedisOps::new(manager)
    }

    #[tokio::test]
    async fn get_on_unreachable_pool_returns_none_not_error() {
        let ops = unreachable_ops();
        assert_eq!(ops.get_string("anything").await, None);
    }

    #[tokio::test]
    async fn delete_on_unreachable_pool_returns_false() {
        let ops = unreachable_ops();
        assert!(!ops.delete("anything").await);
    }

    #[tokio::test]
    async fn scan_keys_on_unreachable_pool_returns_empty() {
        let ops = unreachable_ops();
        assert!(ops.scan_keys("pattern:*").await.is_empty());
    }
}
