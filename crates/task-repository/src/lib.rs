//! Components J and K: the relational store behind task configs and
//! their execution history.

pub mod config_repository;
pub mod execution_repository;
pub mod pool;

pub use config_repository::{OrderDir, OrderField, TaskConfigQuery, TaskConfigRepository};
pub use execution_repository::{ExecutionRepository, ExecutionStats};
pub use pool::DatabasePool;
