//! Dynamic settings service: process-wide overridable configuration
//! backed by Redis, with an in-memory snapshot for lock-protected
//! O(1) reads.

pub mod settings;

pub use settings::{DefaultsLoader, DynamicSettingsService, SettingsMeta, StaticDefaults};
