pub mod composer;
pub mod runner;

pub use composer::ReplyComposer;
pub use runner::{Agent, RunStats, truncate_to_budget};
