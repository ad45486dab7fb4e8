//! Typed serialization envelope for cached values, and the two
//! in-process registries (schema-object / orm-object) that let the
//! deserialization side reconstruct a concrete Rust type from a
//! `__model__` name recorded at cache-write time.
//!
//! Rust has no runtime type reflection, so where the source system
//! dispatches on a live class object, this module dispatches on an
//! explicit registration: each cacheable type registers a constructor
//! closure once at startup (see `SchemaRegistry::register`), keyed by
//! its own declared model name.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use task_core::TaskError;

/// Discriminates the shape of the cached value, mirroring the source
/// system's `__type__` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Primitive,
    List,
    Tuple,
    Dict,
    SchemaObject,
    OrmObject,
}

/// The on-the-wire shape of every cached value: `{__type__, __model__, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope {
    #[serde(rename = "__type__")]
    pub kind: EnvelopeKind,
    #[serde(rename = "__model__", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub data: serde_json::Value,
}

impl CacheEnvelope {
    #[must_use]
    pub fn primitive(data: serde_json::Value) -> Self {
        Self {
            kind: EnvelopeKind::Primitive,
            model: None,
            data,
        }
    }

    #[must_use]
    pub fn container(kind: EnvelopeKind, data: serde_json::Value) -> Self {
        debug_assert!(matches!(
            kind,
            EnvelopeKind::List | EnvelopeKind::Tuple | EnvelopeKind::Dict
        ));
        Self {
            kind,
            model: None,
            data,
        }
    }

    #[must_use]
    pub fn schema_object(model: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: EnvelopeKind::SchemaObject,
            model: Some(model.into()),
            data,
        }
    }

    #[must_use]
    pub fn orm_object(model: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: EnvelopeKind::OrmObject,
            model: Some(model.into()),
            data,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TaskError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TaskError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Wraps a plain `Serialize` value into an envelope, applying the
/// datetime/decimal-to-string fallback the source system performs.
pub fn envelope_for_value<T: Serialize>(value: &T) -> Result<CacheEnvelope, TaskError> {
    let data = serde_json::to_value(value)?;
    let kind = match &data {
        serde_json::Value::Array(_) => EnvelopeKind::List,
        serde_json::Value::Object(_) => EnvelopeKind::Dict,
        _ => EnvelopeKind::Primitive,
    };
    Ok(CacheEnvelope { kind, model: None, data })
}

/// Reconstructs a plain value (container or primitive) from its envelope.
/// Schema/orm objects go through the registries below instead.
pub fn value_from_envelope<T: DeserializeOwned>(envelope: &CacheEnvelope) -> Result<T, TaskError> {
    serde_json::from_value(envelope.data.clone())
        .map_err(|e| TaskError::internal(format!("cache deserialization failed: {e}")))
}

type SchemaCtor = Arc<dyn Fn(serde_json::Value) -> Result<Box<dyn Any + Send>, TaskError> + Send + Sync>;

/// Maps a schema-object's model name to a constructor that validates
/// the stored JSON against that type.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    ctors: HashMap<String, SchemaCtor>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `model_name`. Call once at startup for every
    /// schema type that may be cached.
    pub fn register<T>(&mut self, model_name: impl Into<String>)
    where
        T: DeserializeOwned + Send + 'static,
    {
        let ctor: SchemaCtor = Arc::new(|data| {
            let value: T = serde_json::from_value(data)
                .map_err(|e| TaskError::internal(format!("schema validation failed: {e}")))?;
            Ok(Box::new(value))
        });
        self.ctors.insert(model_name.into(), ctor);
    }

    /// Reconstructs and downcasts to `T`. Fails with an internal error if
    /// `model_name` was never registered (mirrors the source system's
    /// "unregistered types fail deserialization" fallback).
    pub fn deserialize<T: 'static>(
        &self,
        model_name: &str,
        data: serde_json::Value,
    ) -> Result<T, TaskError> {
        let ctor = self.ctors.get(model_name).ok_or_else(|| {
            TaskError::internal(format!("no schema registered for model `{model_name}`"))
        })?;
        let boxed = ctor(data)?;
        boxed
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| TaskError::internal("schema registry type mismatch"))
    }

    #[must_use]
    pub fn contains(&self, model_name: &str) -> bool {
        self.ctors.contains_key(model_name)
    }
}

type OrmCtor = Arc<dyn Fn(Vec<serde_json::Value>) -> Result<Box<dyn Any + Send>, TaskError> + Send + Sync>;

/// Maps an ORM entity's model name to a positional constructor. Only
/// column attributes are ever serialized for ORM objects — relations are
/// never part of the envelope, which is what prevents a cache hit from
/// triggering a lazy-load or reconstructing a reference cycle.
#[derive(Clone, Default)]
pub struct OrmRegistry {
    ctors: HashMap<String, OrmCtor>,
}

impl OrmRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T, F>(&mut self, model_name: impl Into<String>, ctor: F)
    where
        T: Send + 'static,
        F: Fn(Vec<serde_json::Value>) -> Result<T, TaskError> + Send + Sync + 'static,
    {
        let boxed_ctor: OrmCtor = Arc::new(move |columns| ctor(columns).map(|v| Box::new(v) as Box<dyn Any + Send>));
        self.ctors.insert(model_name.into(), boxed_ctor);
    }

    pub fn deserialize<T: 'static>(
        &self,
        model_name: &str,
        columns: Vec<serde_json::Value>,
    ) -> Result<T, TaskError> {
        let ctor = self.ctors.get(model_name).ok_or_else(|| {
            TaskError::internal(format!("no orm constructor registered for model `{model_name}`"))
        })?;
        let boxed = ctor(columns)?;
        boxed
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| TaskError::internal("orm registry type mismatch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: i64,
        name: String,
    }

    #[test]
    fn plain_dict_roundtrips_through_envelope() {
        let widget = Widget { id: 1, name: "gear".into() };
        let envelope = envelope_for_value(&widget).unwrap();
        assert_eq!(envelope.kind, EnvelopeKind::Dict);
        let restored: Widget = value_from_envelope(&envelope).unwrap();
        assert_eq!(widget, restored);
    }

    #[test]
    fn schema_registry_round_trips_registered_type() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Widget>("Widget");
        let data = serde_json::to_value(Widget { id: 2, name: "bolt".into() }).unwrap();
        let restored: Widget = registry.deserialize("Widget", data).unwrap();
        assert_eq!(restored.id, 2);
    }

    #[test]
    fn schema_registry_rejects_unregistered_model() {
        let registry = SchemaRegistry::new();
        let result: Result<Widget, _> = registry.deserialize("Unknown", serde_json::json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn orm_registry_builds_from_positional_columns() {
        let mut registry = OrmRegistry::new();
        registry.register::<Widget, _>("Widget", |cols| {
            let id = cols
                .first()
                .and_then(serde_json::Value::as_i64)
                .ok_or_else(|| TaskError::internal("missing id column"))?;
            let name = cols
                .get(1)
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| TaskError::internal("missing name column"))?
                .to_string();
            Ok(Widget { id, name })
        });
        let widget: Widget = registry
            .deserialize("Widget", vec![serde_json::json!(5), serde_json::json!("nut")])
            .unwrap();
        assert_eq!(widget, Widget { id: 5, name: "nut".into() });
    }
}
