//! Shared primitives for the task scheduling platform: the unified error
//! type, typed identifiers, pagination, common traits and telemetry setup.
//! Every other crate in the workspace depends on this one and nothing else
//! depends on them.

pub mod error;
pub mod id;
pub mod model;
pub mod pagination;
pub mod result;
pub mod telemetry;
pub mod traits;

pub use error::*;
pub use id::*;
pub use model::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;
