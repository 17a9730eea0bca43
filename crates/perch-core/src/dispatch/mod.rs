pub mod blacklist;
pub mod dedup;
pub mod engine;

pub use blacklist::Blacklist;
pub use dedup::SeenMessages;
pub use engine::{DispatchEngine, EventOutcome, IgnoreReason, MaintenanceReport, ReplyTarget};
