//! Components G, H, I: the cron/date scheduling engine, its Redis-backed
//! state store, and the lifecycle facade composing the two with the
//! task registry and the relational config store.

pub mod cron_engine;
pub mod facade;
pub mod lock_pool;
pub mod scheduler_core;
pub mod state_store;

pub use cron_engine::{CronEngine, CronEntry, InMemoryCronEngine, ScheduleRule};
pub use facade::{OrphanSchedule, SchedulerFacade};
pub use lock_pool::LockPool;
pub use scheduler_core::{ScheduleSummary, SchedulerCore};
pub use state_store::{ScheduleEvent, ScheduleFullInfo, ScheduleMeta, ScheduleStateStore, ScheduleStatusSummary};
