//! Prometheus-style metrics, grounded on
//! `arcana-jobs::metrics` (named-constant modules + `describe_*!` at
//! startup + per-concern recorder structs wrapping the `metrics` crate's
//! macros).

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Metric name constants, one module per concern, mirroring
/// `arcana-jobs::metrics`'s layout.
pub mod names {
    pub const TASK_CONFIGS_LISTED: &str = "task_platform_task_configs_listed_total";
    pub const TASK_CONFIG_CREATED: &str = "task_platform_task_config_created_total";
    pub const TASK_CONFIG_DELETED: &str = "task_platform_task_config_deleted_total";
    pub const SCHEDULES_ACTIVE: &str = "task_platform_schedules_active";
    pub const SCHEDULES_PAUSED: &str = "task_platform_schedules_paused";
    pub const SCHEDULES_ERROR: &str = "task_platform_schedules_error";
    pub const ORPHANS_FOUND: &str = "task_platform_orphans_found_total";
    pub const ORPHANS_CLEANED: &str = "task_platform_orphans_cleaned_total";
    pub const CACHE_HIT: &str = "task_platform_cache_hit_total";
    pub const CACHE_MISS: &str = "task_platform_cache_miss_total";
    pub const FACADE_OPERATION_DURATION: &str = "task_platform_facade_operation_duration_seconds";
}

/// Registers every metric this crate emits with the global recorder,
/// supplying a human-readable description. Call once at startup, after
/// the process-wide recorder (e.g. `PrometheusBuilder`) is installed.
pub fn register_metrics() {
    describe_counter!(names::TASK_CONFIGS_LISTED, "number of task config list queries served");
    describe_counter!(names::TASK_CONFIG_CREATED, "number of task configs created");
    describe_counter!(names::TASK_CONFIG_DELETED, "number of task configs deleted");
    describe_gauge!(names::SCHEDULES_ACTIVE, "live schedules currently ACTIVE");
    describe_gauge!(names::SCHEDULES_PAUSED, "live schedules currently PAUSED");
    describe_gauge!(names::SCHEDULES_ERROR, "live schedules currently in ERROR");
    describe_counter!(names::ORPHANS_FOUND, "orphaned schedules discovered by reconciliation");
    describe_counter!(names::ORPHANS_CLEANED, "orphaned schedules removed by reconciliation");
    describe_counter!(names::CACHE_HIT, "facade cache hits");
    describe_counter!(names::CACHE_MISS, "facade cache misses");
    describe_histogram!(names::FACADE_OPERATION_DURATION, "facade operation latency in seconds");
}

/// Recorder for the service facade's own operations.
pub struct FacadeMetrics;

impl FacadeMetrics {
    pub fn record_configs_listed() {
        counter!(names::TASK_CONFIGS_LISTED).increment(1);
    }

    pub fn record_config_created() {
        counter!(names::TASK_CONFIG_CREATED).increment(1);
    }

    pub fn record_config_deleted() {
        counter!(names::TASK_CONFIG_DELETED).increment(1);
    }

    pub fn record_schedule_breakdown(active: u64, paused: u64, error: u64) {
        gauge!(names::SCHEDULES_ACTIVE).set(active as f64);
        gauge!(names::SCHEDULES_PAUSED).set(paused as f64);
        gauge!(names::SCHEDULES_ERROR).set(error as f64);
    }

    pub fn record_orphans_found(count: u64) {
        counter!(names::ORPHANS_FOUND).increment(count);
    }

    pub fn record_orphans_cleaned(count: u64) {
        counter!(names::ORPHANS_CLEANED).increment(count);
    }

    pub fn record_cache_hit() {
        counter!(names::CACHE_HIT).increment(1);
    }

    pub fn record_cache_miss() {
        counter!(names::CACHE_MISS).increment(1);
    }

    pub fn record_operation_duration(seconds: f64) {
        histogram!(names::FACADE_OPERATION_DURATION).record(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_metrics_does_not_panic() {
        register_metrics();
    }

    #[test]
    fn facade_metrics_calls_do_not_panic_without_a_recorder() {
        FacadeMetrics::record_configs_listed();
        FacadeMetrics::record_schedule_breakdown(1, 2, 0);
        FacadeMetrics::record_cache_hit();
        FacadeMetrics::record_operation_duration(0.25);
    }
}
