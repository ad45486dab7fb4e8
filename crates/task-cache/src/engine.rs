//! The tag-indexed cache engine. Backs the decorator layer
//! that API-facing query methods use — the decorator is responsible for
//! building `cache_key` from function identity + argument fingerprint;
//! this engine only stores bytes under that key and tracks tag
//! membership for batch invalidation.

use std::sync::Arc;
use task_config::CacheConfig;
use task_redis::{RedisKeys, RedisOps};
use tracing::debug;

/// Long TTL for tag-set membership, refreshed on every tag write so a
/// slow-moving tag doesn't expire out from under a value that's still
/// live.
const TAG_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct CacheEngine {
    ops: RedisOps,
    keys: Arc<RedisKeys>,
    config: CacheConfig,
}

impl CacheEngine {
    #[must_use]
    pub fn new(ops: RedisOps, keys: Arc<RedisKeys>, config: CacheConfig) -> Self {
        Self { ops, keys, config }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub fn default_ttl_secs(&self) -> u64 {
        self.config.default_ttl_secs
    }

    /// Returns the bytes stored under `cache_key`, or `None` on a miss. A
    /// miss is indistinguishable from a cache error to the caller.
    /// Cached values are always UTF-8 (JSON envelopes), so bytes are
    /// carried as a Redis string with no additional encoding.
    pub async fn get(&self, cache_key: &str) -> Option<Vec<u8>> {
        if !self.enabled() {
            return None;
        }
        let key = self.keys.cache_value(cache_key);
        self.ops.get_string(&key).await.map(String::into_bytes)
    }

    /// Plain write, no tag association.
    pub async fn set(&self, cache_key: &str, bytes: &[u8], ttl_secs: Option<u64>) -> bool {
        if !self.enabled() {
            return false;
        }
        let Ok(text) = std::str::from_utf8(bytes) else {
            return false;
        };
        let key = self.keys.cache_value(cache_key);
        let ttl = ttl_secs.unwrap_or_else(|| self.default_ttl_secs());
        self.ops.set_string(&key, text, Some(ttl)).await
    }

    /// Adds `cache_key` to `tag`'s member set and refreshes the tag set's
    /// TTL. Independent of `set` — callers that want a tagged entry issue
    /// both calls; a value written without ever being tagged simply
    /// never participates in batch invalidation.
    pub async fn tag(&self, cache_key: &str, tag: &str) -> bool {
        let tag_key = self.keys.cache_tag(tag);
        let added = self.ops.set_add(&tag_key, cache_key).await;
        self.ops.expire(&tag_key, TAG_TTL_SECS as i64).await;
        added
    }

    pub async fn tag_many(&self, cache_key: &str, tags: &[String]) -> bool {
        let mut all_ok = true;
        for tag in tags {
            all_ok &= self.tag(cache_key, tag).await;
        }
        all_ok
    }

    /// `SMEMBERS` the tag-set, `DEL`s every listed value key plus the
    /// tag-set itself, and returns how many value keys were deleted.
    /// Tolerates orphan tag membership (a member whose value key is
    /// already gone) by simply not counting it — deleting an
    /// already-missing key is a no-op, not an error.
    pub async fn invalidate_by_tag(&self, tag: &str) -> u64 {
        let tag_key = self.keys.cache_tag(tag);
        let members = self.ops.set_members(&tag_key).await;
        if members.is_empty() {
            self.ops.delete(&tag_key).await;
            return 0;
        }
        let value_keys: Vec<String> = members.iter().map(|m| self.keys.cache_value(m)).collect();
        let deleted = self.ops.delete_many(&value_keys).await;
        self.ops.delete(&tag_key).await;
        debug!(tag, deleted, "invalidated cache tag");
        deleted
    }

    pub async fn invalidate_tags(&self, tags: &[String]) -> u64 {
        let mut total = 0;
        for tag in tags {
            total += self.invalidate_by_tag(tag).await;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use task_redis::RedisConnectionManager;

    fn test_engine() -> CacheEngine {
        let mut redis_config = task_config::RedisConfig::default();
        redis_config.url = "redis://127.0.0.1:1".to_string();
        let manager = RedisConnectionManager::connect(&redis_config).unwrap();
        let ops = RedisOps::new(manager);
        let keys = Arc::new(RedisKeys::new("test"));
        CacheEngine::new(ops, keys, CacheConfig::default())
    }

    #[tokio::test]
    async fn disabled_cache_never_stores() {
        let mut engine = test_engine();
        engine.config.enabled = false;
        assert!(!engine.set("k", b"v", None).await);
        assert_eq!(engine.get("k").await, None);
    }

    #[tokio::test]
    async fn miss_on_unreachable_redis_is_none_not_error() {
        let engine = test_engine();
        assert_eq!(engine.get("anything").await, None);
    }

    #[tokio::test]
    async fn invalidate_empty_tag_returns_zero() {
        let engine = test_engine();
        assert_eq!(engine.invalidate_by_tag("nonexistent").await, 0);
    }
}
