//! Tag-indexed cache engine and the typed serialization envelope that
//! lets cached query results be reconstructed as the concrete
//! schema/ORM types callers expect.

pub mod engine;
pub mod envelope;

pub use engine::CacheEngine;
pub use envelope::{CacheEnvelope, EnvelopeKind, OrmRegistry, SchemaRegistry};
