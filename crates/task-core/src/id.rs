//! Typed identifiers, wrapping the underlying primitive so callers can't
//! accidentally pass an execution id where a config id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Primary key of a `TaskConfig` row in the relational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskConfigId(pub i64);

impl TaskConfigId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskConfigId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<TaskConfigId> for i64 {
    fn from(value: TaskConfigId) -> Self {
        value.0
    }
}

/// Primary key of a `TaskExecution` row. Time-ordered (UUIDv7) so that
/// lexicographic and chronological order coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ExecutionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ExecutionId> for Uuid {
    fn from(value: ExecutionId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_config_id_roundtrips_through_i64() {
        let id = TaskConfigId::from(42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn execution_id_generates_unique_time_ordered_values() {
        let a = ExecutionId::new();
        let b = ExecutionId::new();
        assert_ne!(a, b);
        assert!(a.into_inner().get_version_num() == 7);
    }

    #[test]
    fn execution_id_parses_and_displays() {
        let id = ExecutionId::new();
        let parsed = ExecutionId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }
}
