//! Redis substrate for the task platform: connection pooling (A), key
//! namespace (B), and typed base operations (C). Every Redis-touching
//! crate above this one (`task-cache`, `task-settings`, `task-scheduler`)
//! builds on `RedisOps` + `RedisKeys` rather than talking to `redis`
//! directly.

pub mod keys;
pub mod ops;
pub mod pool;

pub use keys::RedisKeys;
pub use ops::RedisOps;
pub use pool::RedisConnectionManager;
