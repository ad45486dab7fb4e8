//! The type descriptor tree and UI-hint inference rules. Rust has no
//! runtime signature introspection, so tasks declare their parameters
//! explicitly (see `task.rs`'s `ParameterSpec`) rather than have them
//! synthesized from a function's type annotations — the tree shape and
//! the inference heuristics are otherwise unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Leaves are primitive tags; internal nodes are the composite shapes a
/// parameter's declared type can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Str,
    Int,
    Float,
    Bool,
    DateTime,
    Unknown,
    Optional { inner: Box<TypeDescriptor> },
    Union { options: Vec<TypeDescriptor> },
    List { item: Box<TypeDescriptor> },
    Tuple { items: Vec<TypeDescriptor> },
    Dict { key: Box<TypeDescriptor>, value: Box<TypeDescriptor> },
    Literal { values: Vec<Value> },
    Enum { name: String },
}

impl TypeDescriptor {
    #[must_use]
    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional { inner: Box::new(inner) }
    }

    #[must_use]
    pub fn list(item: TypeDescriptor) -> Self {
        Self::List { item: Box::new(item) }
    }

    #[must_use]
    pub fn dict(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Dict {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    #[must_use]
    pub fn literal(values: Vec<Value>) -> Self {
        Self::Literal { values }
    }

    #[must_use]
    pub fn r#enum(name: impl Into<String>) -> Self {
        Self::Enum { name: name.into() }
    }

    /// True for `Optional { .. }` nodes — used by the required-parameter
    /// inference rule, which treats an optional type the same as a
    /// default value would (absence is representable).
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional { .. })
    }

    /// Unwraps one layer of `Optional`, returning the inner type. No-op
    /// for every other variant.
    #[must_use]
    pub fn unwrap_optional(&self) -> &TypeDescriptor {
        match self {
            Self::Optional { inner } => inner,
            other => other,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self.unwrap_optional(), Self::Int | Self::Float)
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self.unwrap_optional(), Self::Bool)
    }

    #[must_use]
    pub fn is_selectable(&self) -> bool {
        matches!(self.unwrap_optional(), Self::Literal { .. } | Self::Enum { .. })
    }

    /// Choice values for `select` controls: literal values as-is, enum
    /// names rendered as the single placeholder choice (the concrete
    /// variant list lives with the enum definition, outside this tree).
    #[must_use]
    pub fn choices(&self) -> Option<Vec<Value>> {
        match self.unwrap_optional() {
            Self::Literal { values } => Some(values.clone()),
            Self::Enum { .. } => None,
            _ => None,
        }
    }
}

/// The UI control a form renderer should use for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    Text,
    Number,
    Switch,
    Select,
    Email,
}

/// Per-parameter rendering hints. Any explicit value set at registration
/// time wins over the heuristically inferred one, field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiHints {
    pub control: Option<ControlType>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub choices: Option<Vec<Value>>,
    pub exclude_from_ui: Option<bool>,
    pub description: Option<String>,
    pub example: Option<Value>,
}

impl UiHints {
    /// Overlays `explicit` on top of `inferred`, per-key: every
    /// `Some(_)` field in `explicit` replaces the corresponding field in
    /// `inferred`; `None` fields fall through to the inferred value.
    #[must_use]
    pub fn overlay(inferred: UiHints, explicit: UiHints) -> UiHints {
        UiHints {
            control: explicit.control.or(inferred.control),
            label: explicit.label.or(inferred.label),
            placeholder: explicit.placeholder.or(inferred.placeholder),
            min: explicit.min.or(inferred.min),
            max: explicit.max.or(inferred.max),
            step: explicit.step.or(inferred.step),
            choices: explicit.choices.or(inferred.choices),
            exclude_from_ui: explicit.exclude_from_ui.or(inferred.exclude_from_ui),
            description: explicit.description.or(inferred.description),
            example: explicit.example.or(inferred.example),
        }
    }
}

/// Applies the heuristic rules: literal/enum → select with choices;
/// name ending in `email` → email; bool → switch; numeric → number;
/// everything else → text.
#[must_use]
pub fn infer_ui_hints(param_name: &str, type_descriptor: &TypeDescriptor) -> UiHints {
    let control = if type_descriptor.is_selectable() {
        ControlType::Select
    } else if param_name.to_lowercase().ends_with("email") {
        ControlType::Email
    } else if type_descriptor.is_bool() {
        ControlType::Switch
    } else if type_descriptor.is_numeric() {
        ControlType::Number
    } else {
        ControlType::Text
    };

    UiHints {
        control: Some(control),
        choices: type_descriptor.choices(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_type_infers_select_with_choices() {
        let t = TypeDescriptor::literal(vec![serde_json::json!("a"), serde_json::json!("b")]);
        let hints = infer_ui_hints("mode", &t);
        assert_eq!(hints.control, Some(ControlType::Select));
        assert_eq!(hints.choices, Some(vec![serde_json::json!("a"), serde_json::json!("b")]));
    }

    #[test]
    fn email_suffixed_name_infers_email_control() {
        let hints = infer_ui_hints("notify_email", &TypeDescriptor::Str);
        assert_eq!(hints.control, Some(ControlType::Email));
    }

    #[test]
    fn bool_infers_switch() {
        let hints = infer_ui_hints("enabled", &TypeDescriptor::Bool);
        assert_eq!(hints.control, Some(ControlType::Switch));
    }

    #[test]
    fn optional_bool_still_infers_switch() {
        let hints = infer_ui_hints("enabled", &TypeDescriptor::optional(TypeDescriptor::Bool));
        assert_eq!(hints.control, Some(ControlType::Switch));
    }

    #[test]
    fn numeric_infers_number() {
        let hints = infer_ui_hints("limit", &TypeDescriptor::Int);
        assert_eq!(hints.control, Some(ControlType::Number));
    }

    #[test]
    fn fallback_is_text() {
        let hints = infer_ui_hints("subreddit", &TypeDescriptor::Str);
        assert_eq!(hints.control, Some(ControlType::Text));
    }

    #[test]
    fn explicit_overlay_wins_per_key() {
        let inferred = infer_ui_hints("limit", &TypeDescriptor::Int);
        let explicit = UiHints {
            label: Some("Result limit".to_string()),
            ..Default::default()
        };
        let merged = UiHints::overlay(inferred, explicit);
        assert_eq!(merged.control, Some(ControlType::Number));
        assert_eq!(merged.label, Some("Result limit".to_string()));
    }
}
