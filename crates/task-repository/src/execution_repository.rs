//! The execution repository. Inserted once per fire by
//! the worker's post-execution wrapper; never mutated afterward.
//! Aggregations are pushed down to SQL reductions rather than pulled
//! into process memory.

use crate::pool::DatabasePool;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use task_core::{ExecutionId, TaskConfigId, TaskError, TaskExecution, TaskResult};

#[derive(Debug, FromRow)]
struct ExecutionRow {
    id: String,
    task_id: String,
    config_id: Option<i64>,
    is_success: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    duration_seconds: Option<f64>,
    result: Option<Json<Value>>,
    error_message: Option<String>,
    error_traceback: Option<String>,
}

impl TryFrom<ExecutionRow> for TaskExecution {
    type Error = TaskError;

    fn try_from(row: ExecutionRow) -> Result<Self, Self::Error> {
        let id = ExecutionId::parse(&row.id).map_err(|e| TaskError::integrity(format!("stored execution id is not a uuid: {e}")))?;
        Ok(TaskExecution {
            id,
            task_id: row.task_id,
            config_id: row.config_id.map(TaskConfigId::new),
            is_success: row.is_success,
            started_at: row.started_at,
            completed_at: row.completed_at,
            duration_seconds: row.duration_seconds,
            result: row.result.map(|j| j.0),
            error_message: row.error_message,
            error_traceback: row.error_traceback,
        })
    }
}

/// The aggregation shape shared by both the global and per-config
/// stats endpoints.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExecutionStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub by_type: HashMap<String, u64>,
    pub avg_duration_seconds: Option<f64>,
}

impl ExecutionStats {
    fn from_counts(total: i64, success: i64, avg_duration_seconds: Option<f64>, by_type: HashMap<String, u64>) -> Self {
        let total = total.max(0) as u64;
        let success = success.max(0) as u64;
        let failed = total.saturating_sub(success);
        let (success_rate, failure_rate) = if total == 0 {
            (0.0, 0.0)
        } else {
            (success as f64 / total as f64, failed as f64 / total as f64)
        };
        Self {
            total,
            success,
            failed,
            success_rate,
            failure_rate,
            by_type,
            avg_duration_seconds,
        }
    }
}

pub struct ExecutionRepository {
    pool: DatabasePool,
}

impl ExecutionRepository {
    #[must_use]
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, execution: &TaskExecution) -> TaskResult<()> {
        sqlx::query(
            r#"
            INSERT INTO task_execution
                (id, task_id, config_id, is_success, started_at, completed_at, duration_seconds, result, error_message, error_traceback)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(execution.id.to_string())
        .bind(&execution.task_id)
        .bind(execution.config_id.map(TaskConfigId::into_inner))
        .bind(execution.is_success)
        .bind(execution.started_at)
        .bind(execution.completed_at)
        .bind(execution.duration_seconds)
        .bind(execution.result.clone().map(Json))
        .bind(&execution.error_message)
        .bind(&execution.error_traceback)
        .execute(self.pool.inner())
        .await
        .map_err(TaskError::from)?;
        Ok(())
    }

    pub async fn get_by_config(&self, config_id: TaskConfigId, limit: i64) -> TaskResult<Vec<TaskExecution>> {
        let rows: Vec<ExecutionRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, config_id, is_success, started_at, completed_at, duration_seconds, result, error_message, error_traceback
            FROM task_execution WHERE config_id = ? ORDER BY started_at DESC LIMIT ?
            "#,
        )
        .bind(config_id.into_inner())
        .bind(limit)
        .fetch_all(self.pool.inner())
        .await
        .map_err(TaskError::from)?;
        rows.into_iter().map(TaskExecution::try_from).collect()
    }

    pub async fn get_recent(&self, hours: i64, limit: i64) -> TaskResult<Vec<TaskExecution>> {
        let rows: Vec<ExecutionRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, config_id, is_success, started_at, completed_at, duration_seconds, result, error_message, error_traceback
            FROM task_execution
            WHERE started_at >= DATE_SUB(NOW(), INTERVAL ? HOUR)
            ORDER BY started_at DESC LIMIT ?
            "#,
        )
        .bind(hours)
        .bind(limit)
        .fetch_all(self.pool.inner())
        .await
        .map_err(TaskError::from)?;
        rows.into_iter().map(TaskExecution::try_from).collect()
    }

    pub async fn get_failed(&self, days: i64, limit: i64) -> TaskResult<Vec<TaskExecution>> {
        let rows: Vec<ExecutionRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, config_id, is_success, started_at, completed_at, duration_seconds, result, error_message, error_traceback
            FROM task_execution
            WHERE is_success = FALSE AND started_at >= DATE_SUB(NOW(), INTERVAL ? DAY)
            ORDER BY started_at DESC LIMIT ?
            "#,
        )
        .bind(days)
        .bind(limit)
        .fetch_all(self.pool.inner())
        .await
        .map_err(TaskError::from)?;
        rows.into_iter().map(TaskExecution::try_from).collect()
    }

    pub async fn get_global_stats(&self, days: i64) -> TaskResult<ExecutionStats> {
        self.stats(days, None).await
    }

    pub async fn get_stats_by_config(&self, config_id: TaskConfigId, days: i64) -> TaskResult<ExecutionStats> {
        self.stats(days, Some(config_id)).await
    }

    async fn stats(&self, days: i64, config_id: Option<TaskConfigId>) -> TaskResult<ExecutionStats> {
        let scope_clause = if config_id.is_some() { "AND te.config_id = ?" } else { "" };

        let totals_sql = format!(
            r#"
            SELECT COUNT(*) AS total,
                   SUM(CASE WHEN te.is_success THEN 1 ELSE 0 END) AS success,
                   AVG(te.duration_seconds) AS avg_duration
            FROM task_execution te
            WHERE te.started_at >= DATE_SUB(NOW(), INTERVAL ? DAY) {scope_clause}
            "#
        );
        let mut totals_query = sqlx::query_as::<_, (i64, Option<i64>, Option<f64>)>(&totals_sql).bind(days);
        if let Some(config_id) = config_id {
            totals_query = totals_query.bind(config_id.into_inner());
        }
        let (total, success, avg_duration_seconds) = totals_query.fetch_one(self.pool.inner()).await.map_err(TaskError::from)?;

        let by_type_sql = format!(
            r#"
            SELECT COALESCE(tc.task_type, 'unknown') AS task_type, COUNT(*) AS n
            FROM task_execution te
            LEFT JOIN task_config tc ON tc.id = te.config_id
            WHERE te.started_at >= DATE_SUB(NOW(), INTERVAL ? DAY) {scope_clause}
            GROUP BY task_type
            "#
        );
        let mut by_type_query = sqlx::query_as::<_, (String, i64)>(&by_type_sql).bind(days);
        if let Some(config_id) = config_id {
            by_type_query = by_type_query.bind(config_id.into_inner());
        }
        let by_type_rows = by_type_query.fetch_all(self.pool.inner()).await.map_err(TaskError::from)?;
        let by_type = by_type_rows.into_iter().map(|(task_type, n)| (task_type, n.max(0) as u64)).collect();

        Ok(ExecutionStats::from_counts(total, success.unwrap_or(0), avg_duration_seconds, by_type))
    }

    /// Detaches every execution row referencing `config_id` — deleting
    /// a `TaskConfig` sets `config_id=NULL` on its historical executions
    /// rather than deleting them. Called by the service facade as part
    /// of its delete cascade, not by a database-level FK trigger — this
    /// workspace has no migration/schema file for one to live in.
    pub async fn clear_config_id(&self, config_id: TaskConfigId) -> TaskResult<u64> {
        let result = sqlx::query("UPDATE task_execution SET config_id = NULL WHERE config_id = ?")
            .bind(config_id.into_inner())
            .execute(self.pool.inner())
            .await
            .map_err(TaskError::from)?;
        Ok(result.rows_affected())
    }

    /// Hard-deletes executions older than `days_to_keep`. Retention
    /// policy, not a soft archive.
    pub async fn cleanup_old(&self, days_to_keep: i64) -> TaskResult<u64> {
        let result = sqlx::query("DELETE FROM task_execution WHERE started_at < DATE_SUB(NOW(), INTERVAL ? DAY)")
            .bind(days_to_keep)
            .execute(self.pool.inner())
            .await
            .map_err(TaskError::from)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_from_counts_computes_rates() {
        let stats = ExecutionStats::from_counts(10, 7, Some(1.5), HashMap::new());
        assert_eq!(stats.failed, 3);
        assert!((stats.success_rate - 0.7).abs() < f64::EPSILON);
        assert!((stats.failure_rate - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_from_counts_handles_zero_total() {
        let stats = ExecutionStats::from_counts(0, 0, None, HashMap::new());
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.failure_rate, 0.0);
    }
}
