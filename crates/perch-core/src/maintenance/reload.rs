//! One maintenance pass over an engine, plus the `BlacklistSource` port the
//! infrastructure layer implements for reloadable blacklists.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use perch_types::error::SourceError;
use tracing::{info, warn};

use super::scheduler::MaintenanceTask;
use crate::dispatch::{DispatchEngine, MaintenanceReport};
use crate::sink::ActionSink;

/// Somewhere a fresh blacklist can be read from.
pub trait BlacklistSource: Send + Sync + 'static {
    fn load(&self) -> impl Future<Output = Result<Vec<String>, SourceError>> + Send;
}

/// Evict and decay on `engine`, then reload its blacklist from `source`.
///
/// The reload replaces only names that came from `source`; the agent's
/// configured names stay. A failed reload keeps the current blacklist.
pub async fn maintenance_pass<S, B>(
    engine: &DispatchEngine<S>,
    source: Option<&B>,
    now: DateTime<Utc>,
) -> MaintenanceReport
where
    S: ActionSink,
    B: BlacklistSource,
{
    let mut report = engine.run_maintenance(now);
    if let Some(source) = source {
        match source.load().await {
            Ok(names) => {
                let size = engine.replace_blacklist(names);
                info!(agent = %engine.username(), size, "blacklist reloaded");
                report.blacklist_size = Some(size);
            }
            Err(e) => {
                warn!(agent = %engine.username(), error = %e, "blacklist reload failed, keeping current list");
            }
        }
    }
    report
}

/// Wrap `maintenance_pass` as a scheduler task.
pub fn maintenance_task<S, B>(engine: Arc<DispatchEngine<S>>, source: Option<Arc<B>>) -> MaintenanceTask
where
    S: ActionSink + 'static,
    B: BlacklistSource,
{
    Arc::new(move |now| {
        let engine = engine.clone();
        let source = source.clone();
        async move {
            maintenance_pass::<S, B>(&engine, source.as_deref(), now).await;
        }
        .boxed()
    })
}
