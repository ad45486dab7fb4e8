//! Shared, health-checked Redis connection pool.

use deadpool_redis::{Config as DeadpoolConfig, Connection, Pool, Runtime};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use task_config::RedisConfig;
use task_core::{TaskError, TaskResult};
use tracing::{debug, warn};

/// Minimum time between two health probes; concurrent callers within this
/// window observe the cached result instead of each issuing their own PING.
const PROBE_DEBOUNCE: Duration = Duration::from_secs(2);

/// Shared Redis connection manager.
///
/// Cloning is cheap (an `Arc` around the pool); every component that talks
/// to Redis holds one of these rather than opening its own connections.
#[derive(Clone)]
pub struct RedisConnectionManager {
    pool: Pool,
    healthy: Arc<AtomicBool>,
    last_probe: Arc<Mutex<Option<Instant>>>,
}

impl RedisConnectionManager {
    pub fn connect(config: &RedisConfig) -> TaskResult<Self> {
        let mut cfg = DeadpoolConfig::from_url(&config.url);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(config.pool_size));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| TaskError::internal(format!("failed to build redis pool: {e}")))?;

        Ok(Self {
            pool,
            healthy: Arc::new(AtomicBool::new(true)),
            last_probe: Arc::new(Mutex::new(None)),
        })
    }

    /// Acquires a connection from the pool. Pool exhaustion surfaces as a
    /// `TransientError` so callers can apply a retry-after.
    pub async fn connection(&self) -> TaskResult<Connection> {
        self.pool.get().await.map_err(|e| {
            warn!(error = %e, "redis pool exhausted or connection failed");
            TaskError::transient(format!("redis connection unavailable: {e}"))
        })
    }

    /// Health-checks the pool, debounced so concurrent callers during an
    /// outage don't each open a fresh probe connection. The first caller
    /// past the debounce window probes and publishes the result; everyone
    /// else inside the window reads the cached flag.
    pub async fn health_check(&self) -> bool {
        let should_probe = {
            let mut last = self.last_probe.lock();
            let now = Instant::now();
            let stale = last.map(|t| now.duration_since(t) >= PROBE_DEBOUNCE).unwrap_or(true);
            if stale {
                *last = Some(now);
            }
            stale
        };

        if !should_probe {
            return self.healthy.load(Ordering::Relaxed);
        }

        let result = match self.pool.get().await {
            Ok(mut conn) => conn.ping::<String>().await.is_ok(),
            Err(_) => false,
        };

        debug!(healthy = result, "redis health probe completed");
        self.healthy.store(result, Ordering::Relaxed);
        result
    }

    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl task_core::traits::HealthCheck for RedisConnectionManager {
    fn name(&self) -> &str {
        "redis"
    }

    async fn check(&self) -> task_core::traits::HealthStatus {
        if self.health_check().await {
            task_core::traits::HealthStatus::Healthy
        } else {
            task_core::traits::HealthStatus::Unhealthy("redis ping failed".to_string())
        }
    }
}

trait PingExt {
    async fn ping<T: redis::FromRedisValue>(&mut self) -> redis::RedisResult<T>;
}

impl PingExt for Connection {
    async fn ping<T: redis::FromRedisValue>(&mut self) -> redis::RedisResult<T> {
        redis::cmd("PING").query_async(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_builds_pool_without_connecting() {
        let config = RedisConfig::default();
        let manager = RedisConnectionManager::connect(&config);
        assert!(manager.is_ok());
    }
}
