//! Cron scheduler wrapping `tokio-cron-scheduler` for maintenance jobs.
//!
//! Accepts standard 5- or 6-field cron expressions or an interval phrase
//! ("every 5 minutes", "hourly") and runs one job per agent.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Errors that can occur during scheduling operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Failed to create or manipulate a cron job.
    #[error("scheduler error: {0}")]
    Job(String),

    /// Invalid cron expression or schedule string.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// A job with this name is already registered.
    #[error("maintenance job '{0}' already scheduled")]
    Duplicate(String),
}

/// Normalize a maintenance schedule to a 6-field cron expression.
///
/// Maintenance runs at a fixed interval, so besides raw cron (5 fields get a
/// leading seconds field, 6 pass through) only interval phrases are
/// accepted: "every N seconds|minutes|hours", "every minute", "every hour"
/// and "hourly". Matching is case-insensitive.
pub fn normalize_schedule(input: &str) -> Result<String, SchedulerError> {
    let trimmed = input.trim();
    match trimmed.split_whitespace().count() {
        5 => return Ok(format!("0 {trimmed}")),
        6 => return Ok(trimmed.to_string()),
        _ => {}
    }

    let invalid = || SchedulerError::InvalidSchedule(input.to_string());
    let lower = trimmed.to_lowercase();
    let (count, unit) = match lower.as_str() {
        "hourly" => (1, "hour"),
        phrase => {
            let rest = phrase.strip_prefix("every ").ok_or_else(invalid)?;
            match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
                [unit] => (1, *unit),
                [count, unit] => (count.parse::<u32>().map_err(|_| invalid())?, *unit),
                _ => return Err(invalid()),
            }
        }
    };
    if count == 0 {
        return Err(SchedulerError::InvalidSchedule(
            "interval must be > 0".to_string(),
        ));
    }

    let step = if count == 1 { "*".to_string() } else { format!("*/{count}") };
    match unit.trim_end_matches('s') {
        "second" => Ok(format!("{step} * * * * *")),
        "minute" => Ok(format!("0 {step} * * * *")),
        "hour" => Ok(format!("0 0 {step} * * *")),
        _ => Err(invalid()),
    }
}

/// Work run on every tick, given the fire time.
pub type MaintenanceTask =
    Arc<dyn Fn(DateTime<Utc>) -> futures_util::future::BoxFuture<'static, ()> + Send + Sync>;

/// Runs named maintenance tasks on cron schedules.
pub struct MaintenanceScheduler {
    inner: Arc<RwLock<Option<JobScheduler>>>,
    /// Job name -> normalized cron expression.
    jobs: Arc<RwLock<HashMap<String, String>>>,
}

impl MaintenanceScheduler {
    /// Create a scheduler (not yet started).
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start the scheduler. Must be called before `schedule`.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::Job(e.to_string()))?;

        scheduler
            .start()
            .await
            .map_err(|e| SchedulerError::Job(e.to_string()))?;

        *self.inner.write().await = Some(scheduler);

        tracing::info!("maintenance scheduler started");
        Ok(())
    }

    /// Stop the scheduler and forget every job.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        if let Some(mut scheduler) = self.inner.write().await.take() {
            scheduler
                .shutdown()
                .await
                .map_err(|e| SchedulerError::Job(e.to_string()))?;
            tracing::info!("maintenance scheduler stopped");
        }
        self.jobs.write().await.clear();
        Ok(())
    }

    /// Run `task` on `schedule` under `name` (usually the agent's username).
    pub async fn schedule(
        &self,
        name: &str,
        schedule: &str,
        task: MaintenanceTask,
    ) -> Result<(), SchedulerError> {
        let cron_expr = normalize_schedule(schedule)?;

        if self.jobs.read().await.contains_key(name) {
            return Err(SchedulerError::Duplicate(name.to_string()));
        }

        let inner = self.inner.read().await;
        let scheduler = inner
            .as_ref()
            .ok_or_else(|| SchedulerError::Job("scheduler not started".to_string()))?;

        let job_name = name.to_string();
        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let task = task.clone();
            let job_name = job_name.clone();
            Box::pin(async move {
                let now = Utc::now();
                tracing::debug!(job = %job_name, %now, "maintenance tick");
                task(now).await;
            })
        })
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| SchedulerError::Job(e.to_string()))?;

        tracing::info!(job = %name, cron = %cron_expr, "maintenance scheduled");
        self.jobs.write().await.insert(name.to_string(), cron_expr);
        Ok(())
    }

    /// Normalized cron expression for `name`, if scheduled.
    pub async fn cron_for(&self, name: &str) -> Option<String> {
        self.jobs.read().await.get(name).cloned()
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

impl Default for MaintenanceScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish_non_exhaustive()
    }
}
