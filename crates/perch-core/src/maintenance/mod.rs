//! Periodic maintenance: idle-session eviction, credit decay, and blacklist
//! reload, driven by a cron scheduler.

pub mod reload;
pub mod scheduler;

pub use reload::{BlacklistSource, maintenance_pass, maintenance_task};
pub use scheduler::{MaintenanceScheduler, MaintenanceTask, SchedulerError, normalize_schedule};
