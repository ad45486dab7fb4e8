//! Parameter descriptors and the rules that turn a declared parameter
//! into a fully-structured, UI-renderable unit.

use crate::descriptor::{infer_ui_hints, TypeDescriptor, UiHints};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Names that are always injected by the worker host rather than
/// supplied by the operator, and therefore never part of the
/// user-facing parameter schema.
pub const RESERVED_PARAMETER_NAMES: &[&str] = &["context", "config_id", "task_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Positional,
    Keyword,
}

/// One formal parameter of a registered task, fully resolved: its type
/// tree, default, required-ness, and UI rendering hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: &'static str,
    pub type_info: TypeDescriptor,
    pub default: Option<Value>,
    pub required: bool,
    pub kind: ParameterKind,
    pub ui: UiHints,
}

/// Builder used at task-registration time. Mirrors the source system's
/// per-parameter introspection but is filled in explicitly, since Rust
/// has no runtime signature reflection to synthesize it from.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    type_info: TypeDescriptor,
    default: Option<Value>,
    kind: ParameterKind,
    injected: bool,
    explicit_ui: UiHints,
}

impl ParameterSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, type_info: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            type_info,
            default: None,
            kind: ParameterKind::Keyword,
            injected: false,
            explicit_ui: UiHints::default(),
        }
    }

    #[must_use]
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks this parameter as filled in by the worker host (a context
    /// object, session handle, …) — the Rust analogue of a parameter
    /// whose type resolves through an injection marker.
    #[must_use]
    pub fn injected(mut self) -> Self {
        self.injected = true;
        self
    }

    #[must_use]
    pub fn ui(mut self, ui: UiHints) -> Self {
        self.explicit_ui = ui;
        self
    }

    /// Resolves this spec into the final descriptor, applying the
    /// exclude/required rules and overlaying explicit UI hints on the
    /// heuristically inferred ones.
    #[must_use]
    pub fn build(self) -> ParameterDescriptor {
        let reserved = RESERVED_PARAMETER_NAMES.contains(&self.name.as_str());
        let exclude_from_ui = reserved || self.injected || self.explicit_ui.exclude_from_ui == Some(true);

        let inferred = infer_ui_hints(&self.name, &self.type_info);
        let mut ui = UiHints::overlay(inferred, self.explicit_ui);
        ui.exclude_from_ui = Some(exclude_from_ui);

        let required = self.default.is_none() && !exclude_from_ui;

        ParameterDescriptor {
            name: self.name,
            type_tag: type_tag(&self.type_info),
            type_info: self.type_info,
            default: self.default,
            required,
            kind: self.kind,
            ui,
        }
    }
}

fn type_tag(type_info: &TypeDescriptor) -> &'static str {
    match type_info.unwrap_optional() {
        TypeDescriptor::Str => "str",
        TypeDescriptor::Int => "int",
        TypeDescriptor::Float => "float",
        TypeDescriptor::Bool => "bool",
        TypeDescriptor::DateTime => "datetime",
        TypeDescriptor::Unknown => "unknown",
        TypeDescriptor::Optional { .. } => "optional",
        TypeDescriptor::Union { .. } => "union",
        TypeDescriptor::List { .. } => "list",
        TypeDescriptor::Tuple { .. } => "tuple",
        TypeDescriptor::Dict { .. } => "dict",
        TypeDescriptor::Literal { .. } => "literal",
        TypeDescriptor::Enum { .. } => "enum",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_iff_no_default_and_not_excluded() {
        let required = ParameterSpec::new("subreddit", TypeDescriptor::Str).build();
        assert!(required.required);

        let with_default = ParameterSpec::new("limit", TypeDescriptor::Int)
            .default(serde_json::json!(25))
            .build();
        assert!(!with_default.required);

        let excluded = ParameterSpec::new("context", TypeDescriptor::Unknown).build();
        assert!(!excluded.required);
        assert_eq!(excluded.ui.exclude_from_ui, Some(true));
    }

    #[test]
    fn injected_marker_excludes_regardless_of_name() {
        let spec = ParameterSpec::new("session", TypeDescriptor::Unknown).injected().build();
        assert_eq!(spec.ui.exclude_from_ui, Some(true));
        assert!(!spec.required);
    }

    #[test]
    fn reserved_names_are_excluded_even_without_default() {
        for name in RESERVED_PARAMETER_NAMES {
            let spec = ParameterSpec::new(*name, TypeDescriptor::Str).build();
            assert_eq!(spec.ui.exclude_from_ui, Some(true));
            assert!(!spec.required);
        }
    }

    #[test]
    fn optional_type_does_not_force_exclusion_but_default_absence_requires() {
        let spec = ParameterSpec::new("tag", TypeDescriptor::optional(TypeDescriptor::Str)).build();
        assert!(spec.required);
    }
}
