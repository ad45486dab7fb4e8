//! The task registry. Turns explicitly-declared task
//! parameter schemas into UI-renderable, validated, schedulable units —
//! a metaprogramming-style registry adapted to a language without
//! runtime signature reflection.

pub mod descriptor;
pub mod parameter;
pub mod registry;
pub mod task;

pub use descriptor::{infer_ui_hints, ControlType, TypeDescriptor, UiHints};
pub use parameter::{ParameterDescriptor, ParameterKind, ParameterSpec, RESERVED_PARAMETER_NAMES};
pub use registry::{TaskInfo, TaskRegistry};
pub use task::{Task, TaskContext};
