//! Connection pool for the relational store, grounded on
//! `arcana-repository::pool::DatabasePool` — generalized to drop the
//! Shaku DI wrapper (this workspace composes repositories by hand, see
//! `task-platform`) but keeping the same connect/health-check/migrate
//! shape.

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use task_config::DatabaseConfig;
use task_core::traits::{HealthCheck, HealthStatus};
use task_core::TaskResult;
use tracing::{info, warn};

#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
}

impl DatabasePool {
    pub async fn connect(config: &DatabaseConfig) -> TaskResult<Self> {
        info!("connecting to relational store");
        let pool = MySqlPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .connect(&config.url)
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to connect to relational store");
                task_core::TaskError::transient(format!("database connection failed: {e}"))
            })?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn close(&self) {
        info!("closing relational store connection pool");
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl HealthCheck for DatabasePool {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}
