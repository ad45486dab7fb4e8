//! The platform's aggregate configuration document.

use serde::{Deserialize, Serialize};
use task_core::telemetry::TelemetryConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            database: DatabaseConfig::default(),
            redis: RedisConfig::default(),
            cache: CacheConfig::default(),
            settings: SettingsConfig::default(),
            scheduler: SchedulerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_min_connections() -> u32 {
    2
}
fn default_max_connections() -> u32 {
    10
}
fn default_acquire_timeout_secs() -> u64 {
    10
}
fn default_idle_timeout_secs() -> u64 {
    600
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn default_pool_size() -> usize {
    16
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_key_prefix() -> String {
    "taskplatform".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_pool_size(),
            connect_timeout_secs: default_connect_timeout_secs(),
            key_prefix: default_key_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub default_ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}
fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            default_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_refresh_secs")]
    pub refresh_interval_secs: u64,
}

fn default_settings_refresh_secs() -> u64 {
    30
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_settings_refresh_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_scheduler_key_prefix")]
    pub key_prefix: String,
    /// Glob pattern matching keys written by a prior, now-legacy scheduler
    /// deployment. Kept configurable rather than hardcoded — see
    /// `DESIGN.md`'s Open Question decision.
    #[serde(default = "default_legacy_key_pattern")]
    pub legacy_key_pattern: String,
    /// Execution rows older than this are eligible for
    /// `ExecutionRepository::cleanup_old` (default >= 90 days).
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// How often the platform's background loop runs the retention
    /// sweep. Separate from `check_interval_secs`, which drives orphan
    /// reconciliation.
    #[serde(default = "default_retention_check_interval_secs")]
    pub retention_check_interval_secs: u64,
}

fn default_check_interval_secs() -> u64 {
    60
}
fn default_poll_interval_secs() -> u64 {
    10
}
fn default_scheduler_key_prefix() -> String {
    "taskplatform:schedule".to_string()
}
fn default_legacy_key_pattern() -> String {
    "btu_scheduler:*".to_string()
}
fn default_retention_days() -> i64 {
    90
}
fn default_retention_check_interval_secs() -> u64 {
    24 * 60 * 60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            key_prefix: default_scheduler_key_prefix(),
            legacy_key_pattern: default_legacy_key_pattern(),
            retention_days: default_retention_days(),
            retention_check_interval_secs: default_retention_check_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.redis.pool_size, 16);
        assert!(config.cache.enabled);
        assert_eq!(config.scheduler.legacy_key_pattern, "btu_scheduler:*");
    }
}
