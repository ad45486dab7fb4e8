//! Cache keys and tags for the service facade, grounded on
//! `arcana-service::cache::cache_keys`'s free-function builders. This
//! crate uses `task-cache`'s exact-tag-set model (`CacheEngine::tag` /
//! `invalidate_by_tag`) rather than a wildcard-glob invalidation,
//! since that is the mechanism `task-cache` actually implements.

/// Tag covering every cached `list_task_configs` page.
pub const TAG_TASK_CONFIGS: &str = "task_configs";

/// Tag covering every cached `get_task_config` detail view.
pub const TAG_TASK_CONFIG_DETAIL: &str = "task_config_detail";

/// Tag covering the system status/health/dashboard aggregations.
pub const TAG_SYSTEM_STATUS: &str = "system_status";

/// Tag covering cached live-schedule listings.
pub const TAG_SCHEDULE_LIST: &str = "schedule_list";

#[must_use]
pub fn task_configs_key(query_fingerprint: &str) -> String {
    format!("task_configs:list:{query_fingerprint}")
}

#[must_use]
pub fn task_config_detail_key(config_id: i64, with_stats: bool) -> String {
    format!("task_config:detail:{config_id}:{with_stats}")
}

#[must_use]
pub fn system_status_key() -> String {
    "system:status".to_string()
}

#[must_use]
pub fn system_health_key() -> String {
    "system:health".to_string()
}

#[must_use]
pub fn system_dashboard_key() -> String {
    "system:dashboard".to_string()
}

#[must_use]
pub fn system_enums_key() -> String {
    "system:enums".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_key_distinguishes_with_stats() {
        assert_ne!(task_config_detail_key(1, true), task_config_detail_key(1, false));
    }

    #[test]
    fn list_key_varies_with_fingerprint() {
        assert_ne!(task_configs_key("a"), task_configs_key("b"));
    }
}
