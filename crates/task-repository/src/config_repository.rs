//! The task config repository. Dynamic filter/sort/paginate
//! query over `task_config` rows, grounded on
//! `MySqlUserRepository` (`FromRow` row struct + `TryFrom` into the
//! domain type, `?` placeholders, COUNT-then-SELECT pagination).

use crate::pool::DatabasePool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use task_core::{ConfigLookup, Page, PageRequest, SchedulerType, TaskConfig, TaskConfigId, TaskError, TaskResult};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Name,
    TaskType,
    SchedulerType,
    CreatedAt,
    UpdatedAt,
    Priority,
}

impl OrderField {
    const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::TaskType => "task_type",
            Self::SchedulerType => "scheduler_type",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// The dynamic filter/sort/paginate query shape. Built as a struct
/// rather than a free-form map — every field the platform supports is
/// named, avoiding arbitrary SQL injected through a filter key.
#[derive(Debug, Clone)]
pub struct TaskConfigQuery {
    pub name_search: Option<String>,
    pub task_type: Option<String>,
    pub scheduler_type: Option<SchedulerType>,
    pub order_by: OrderField,
    pub order_dir: OrderDir,
    pub page: PageRequest,
}

impl Default for TaskConfigQuery {
    fn default() -> Self {
        Self {
            name_search: None,
            task_type: None,
            scheduler_type: None,
            order_by: OrderField::UpdatedAt,
            order_dir: OrderDir::Desc,
            page: PageRequest::first(),
        }
    }
}

#[derive(Debug, FromRow)]
struct TaskConfigRow {
    id: i64,
    name: String,
    task_type: String,
    scheduler_type: String,
    parameters: Json<Value>,
    schedule_config: Json<Value>,
    max_retries: i32,
    timeout_seconds: Option<i64>,
    priority: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskConfigRow> for TaskConfig {
    type Error = TaskError;

    fn try_from(row: TaskConfigRow) -> Result<Self, Self::Error> {
        let scheduler_type = parse_scheduler_type(&row.scheduler_type)?;
        let schedule_config = serde_json::from_value(row.schedule_config.0)
            .map_err(|e| TaskError::integrity(format!("stored schedule_config is malformed: {e}")))?;
        let parameters = match row.parameters.0 {
            Value::Object(map) => map,
            other => return Err(TaskError::integrity(format!("stored parameters is not an object: {other}"))),
        };
        Ok(TaskConfig {
            id: TaskConfigId::new(row.id),
            name: row.name,
            task_type: row.task_type,
            scheduler_type,
            parameters,
            schedule_config,
            max_retries: row.max_retries,
            timeout_seconds: row.timeout_seconds,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_scheduler_type(raw: &str) -> TaskResult<SchedulerType> {
    match raw {
        "MANUAL" => Ok(SchedulerType::Manual),
        "CRON" => Ok(SchedulerType::Cron),
        "DATE" => Ok(SchedulerType::Date),
        other => Err(TaskError::integrity(format!("unknown scheduler_type `{other}` in storage"))),
    }
}

pub struct TaskConfigRepository {
    pool: DatabasePool,
}

impl TaskConfigRepository {
    #[must_use]
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, config: &TaskConfig) -> TaskResult<TaskConfig> {
        config.validate_schedule_shape()?;
        let result = sqlx::query(
            r#"
            INSERT INTO task_config
                (name, task_type, scheduler_type, parameters, schedule_config, max_retries, timeout_seconds, priority)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&config.name)
        .bind(config.task_type.clone())
        .bind(config.scheduler_type.as_str())
        .bind(Json(Value::Object(config.parameters.clone())))
        .bind(Json(serde_json::to_value(&config.schedule_config)?))
        .bind(config.max_retries)
        .bind(config.timeout_seconds)
        .bind(config.priority)
        .execute(self.pool.inner())
        .await
        .map_err(TaskError::from)?;

        let id = TaskConfigId::new(result.last_insert_id() as i64);
        self.get(id).await?.ok_or_else(|| TaskError::internal("task_config vanished immediately after insert"))
    }

    pub async fn get(&self, id: TaskConfigId) -> TaskResult<Option<TaskConfig>> {
        let row: Option<TaskConfigRow> = sqlx::query_as(
            r#"
            SELECT id, name, task_type, scheduler_type, parameters, schedule_config,
                   max_retries, timeout_seconds, priority, created_at, updated_at
            FROM task_config WHERE id = ?
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await
        .map_err(TaskError::from)?;
        row.map(TaskConfig::try_from).transpose()
    }

    pub async fn update(&self, config: &TaskConfig) -> TaskResult<TaskConfig> {
        config.validate_schedule_shape()?;
        sqlx::query(
            r#"
            UPDATE task_config
            SET name = ?, task_type = ?, scheduler_type = ?, parameters = ?, schedule_config = ?,
                max_retries = ?, timeout_seconds = ?, priority = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&config.name)
        .bind(config.task_type.clone())
        .bind(config.scheduler_type.as_str())
        .bind(Json(Value::Object(config.parameters.clone())))
        .bind(Json(serde_json::to_value(&config.schedule_config)?))
        .bind(config.max_retries)
        .bind(config.timeout_seconds)
        .bind(config.priority)
        .bind(config.id.into_inner())
        .execute(self.pool.inner())
        .await
        .map_err(TaskError::from)?;
        self.get(config.id)
            .await?
            .ok_or_else(|| TaskError::not_found("task_config", config.id))
    }

    /// Row deletion only — cascading schedule unregistration is the
    /// service facade's responsibility, not this layer's.
    pub async fn delete(&self, id: TaskConfigId) -> TaskResult<()> {
        let result = sqlx::query("DELETE FROM task_config WHERE id = ?")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await
            .map_err(TaskError::from)?;
        if result.rows_affected() == 0 {
            return Err(TaskError::not_found("task_config", id));
        }
        Ok(())
    }

    /// Runs the dynamic filter/sort/paginate query.
    pub async fn get_by_query(&self, query: &TaskConfigQuery) -> TaskResult<Page<TaskConfig>> {
        debug!(?query.name_search, ?query.task_type, "querying task configs");

        let mut where_clauses: Vec<&str> = Vec::new();
        if query.name_search.is_some() {
            where_clauses.push("name LIKE ?");
        }
        if query.task_type.is_some() {
            where_clauses.push("task_type = ?");
        }
        if query.scheduler_type.is_some() {
            where_clauses.push("scheduler_type = ?");
        }
        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let name_like = query.name_search.as_ref().map(|n| format!("%{n}%"));

        let count_sql = format!("SELECT COUNT(*) FROM task_config {where_sql}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(name_like) = &name_like {
            count_query = count_query.bind(name_like);
        }
        if let Some(task_type) = &query.task_type {
            count_query = count_query.bind(task_type);
        }
        if let Some(scheduler_type) = &query.scheduler_type {
            count_query = count_query.bind(scheduler_type.as_str());
        }
        let total: i64 = count_query.fetch_one(self.pool.inner()).await.map_err(TaskError::from)?;

        let select_sql = format!(
            r#"
            SELECT id, name, task_type, scheduler_type, parameters, schedule_config,
                   max_retries, timeout_seconds, priority, created_at, updated_at
            FROM task_config
            {where_sql}
            ORDER BY {} {}
            LIMIT ? OFFSET ?
            "#,
            query.order_by.column(),
            query.order_dir.sql()
        );
        let mut select_query = sqlx::query_as::<_, TaskConfigRow>(&select_sql);
        if let Some(name_like) = &name_like {
            select_query = select_query.bind(name_like);
        }
        if let Some(task_type) = &query.task_type {
            select_query = select_query.bind(task_type);
        }
        if let Some(scheduler_type) = &query.scheduler_type {
            select_query = select_query.bind(scheduler_type.as_str());
        }
        let rows = select_query
            .bind(query.page.limit() as i64)
            .bind(query.page.offset() as i64)
            .fetch_all(self.pool.inner())
            .await
            .map_err(TaskError::from)?;

        let items = rows.into_iter().map(TaskConfig::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, query.page, total.max(0) as u64))
    }
}

#[async_trait]
impl ConfigLookup for TaskConfigRepository {
    async fn find_config(&self, config_id: i64) -> TaskResult<Option<TaskConfig>> {
        self.get(TaskConfigId::new(config_id)).await
    }

    async fn list_schedulable_configs(&self) -> TaskResult<Vec<TaskConfig>> {
        let rows: Vec<TaskConfigRow> = sqlx::query_as(
            r#"
            SELECT id, name, task_type, scheduler_type, parameters, schedule_config,
                   max_retries, timeout_seconds, priority, created_at, updated_at
            FROM task_config WHERE scheduler_type != 'MANUAL'
            "#,
        )
        .fetch_all(self.pool.inner())
        .await
        .map_err(TaskError::from)?;
        rows.into_iter().map(TaskConfig::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_type_parsing_rejects_unknown_values() {
        assert!(parse_scheduler_type("WEEKLY").is_err());
        assert!(matches!(parse_scheduler_type("CRON"), Ok(SchedulerType::Cron)));
    }

    #[test]
    fn default_query_orders_by_updated_at_desc() {
        let query = TaskConfigQuery::default();
        assert_eq!(query.order_by.column(), "updated_at");
        assert_eq!(query.order_dir.sql(), "DESC");
    }
}
