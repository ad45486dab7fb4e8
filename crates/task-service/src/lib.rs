//! The task service facade — the API-visible surface of
//! the platform, orchestrating the relational config store, the
//! scheduler lifecycle and state store, and execution statistics.
//! Also carries the ambient metrics layer.

pub mod cache_tags;
pub mod dto;
pub mod facade;
pub mod metrics;

pub use dto::{
    ComponentHealth, ScheduleInstanceView, SystemDashboard, SystemEnums, SystemHealth, SystemStatus, TaskConfigDetail,
    TaskConfigView, TaskInfoList,
};
pub use facade::TaskServiceFacade;
pub use metrics::{register_metrics, FacadeMetrics};
