//! The Redis key namespace. Every key written or read
//! anywhere in the platform is produced by a function in this module —
//! no other crate is allowed to `format!` a Redis key by hand.

/// Builds every Redis key the platform touches, under a single
/// per-deployment prefix (e.g. `taskplatform`).
#[derive(Debug, Clone)]
pub struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // --- app:* ---------------------------------------------------------

    #[must_use]
    pub fn dynamic_settings(&self) -> String {
        format!("{}:app:dynamic_settings", self.prefix)
    }

    #[must_use]
    pub fn dynamic_settings_meta(&self) -> String {
        format!("{}:app:dynamic_settings:meta", self.prefix)
    }

    // --- cache:* ---------------------------------------------------------

    #[must_use]
    pub fn cache_value(&self, key: &str) -> String {
        format!("{}:cache:{}", self.prefix, key)
    }

    #[must_use]
    pub fn cache_tag(&self, tag: &str) -> String {
        format!("{}:cache:tag:{}", self.prefix, tag)
    }

    // --- schedule:* ---------------------------------------------------------

    #[must_use]
    pub fn schedule_status(&self, schedule_id: &str) -> String {
        format!("{}:schedule:status:{}", self.prefix, schedule_id)
    }

    #[must_use]
    pub fn schedule_meta(&self, schedule_id: &str) -> String {
        format!("{}:schedule:meta:{}", self.prefix, schedule_id)
    }

    #[must_use]
    pub fn schedule_history(&self, schedule_id: &str) -> String {
        format!("{}:schedule:history:{}", self.prefix, schedule_id)
    }

    #[must_use]
    pub fn schedule_index(&self, config_id: i64) -> String {
        format!("{}:schedule:index:config:{}", self.prefix, config_id)
    }

    /// Glob matching every `schedule:status:*` key, used by the summary scan.
    #[must_use]
    pub fn schedule_status_glob(&self) -> String {
        format!("{}:schedule:status:*", self.prefix)
    }

    /// Builds a globally-unique `schedule_id` of the canonical form
    /// `schedule:config:<config_id>:<uid>`. `uid` is an 8-32 hex-char
    /// random string; a fresh one is generated when `uid` is `None`.
    #[must_use]
    pub fn build_schedule_id(config_id: i64, uid: Option<&str>) -> String {
        let uid = match uid {
            Some(u) => u.to_string(),
            None => random_hex_uid(16),
        };
        format!("schedule:config:{config_id}:{uid}")
    }

    /// Recovers `config_id` from a `schedule_id` produced by
    /// [`Self::build_schedule_id`]. Returns `None` for legacy or malformed
    /// ids — callers must fall back to a metadata lookup in that case.
    #[must_use]
    pub fn parse_config_id(schedule_id: &str) -> Option<i64> {
        let mut parts = schedule_id.splitn(4, ':');
        let scheme = parts.next()?;
        let scope = parts.next()?;
        let config_id = parts.next()?;
        if scheme != "schedule" || scope != "config" {
            return None;
        }
        config_id.parse().ok()
    }

    // --- auth:* ---------------------------------------------------------
    // Out of scope for this platform; namespace reserved so nothing
    // here accidentally collides with the auth service's keys.

    #[must_use]
    pub fn auth_reserved(&self, suffix: &str) -> String {
        format!("{}:auth:{}", self.prefix, suffix)
    }
}

fn random_hex_uid(len: usize) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex.chars().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_id_roundtrips_config_id() {
        let id = RedisKeys::build_schedule_id(42, None);
        assert!(id.starts_with("schedule:config:42:"));
        assert_eq!(RedisKeys::parse_config_id(&id), Some(42));
    }

    #[test]
    fn schedule_id_accepts_forced_uid() {
        let id = RedisKeys::build_schedule_id(7, Some("deadbeef"));
        assert_eq!(id, "schedule:config:7:deadbeef");
    }

    #[test]
    fn parse_config_id_rejects_legacy_formats() {
        assert_eq!(RedisKeys::parse_config_id("btu_scheduler:some:id"), None);
        assert_eq!(RedisKeys::parse_config_id("not-a-schedule-id"), None);
    }

    #[test]
    fn keys_are_namespaced_by_prefix() {
        let keys = RedisKeys::new("taskplatform");
        assert_eq!(
            keys.schedule_status("schedule:config:1:abcd"),
            "taskplatform:schedule:status:schedule:config:1:abcd"
        );
        assert_eq!(keys.cache_tag("task_configs"), "taskplatform:cache:tag:task_configs");
        assert_eq!(keys.schedule_index(1), "taskplatform:schedule:index:config:1");
    }

    #[test]
    fn two_generated_ids_are_distinct() {
        let a = RedisKeys::build_schedule_id(1, None);
        let b = RedisKeys::build_schedule_id(1, None);
        assert_ne!(a, b);
    }
}
