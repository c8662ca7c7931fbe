//! Cron scheduler wrapping `tokio-cron-scheduler` for the daily reminder.
//!
//! The reminder fires once a day at a local wall-clock time. The local time
//! and the configured fixed UTC offset are folded into a UTC cron expression,
//! so the scheduler itself never deals with time zones.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveTime, Timelike, Utc};
use futures_util::future::BoxFuture;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// Errors that can occur during scheduling operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Failed to create or manipulate a cron job.
    #[error("scheduler error: {0}")]
    JobError(String),

    /// Invalid cron expression.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
}

/// Callback invoked with the UTC instant each time the reminder fires.
pub type ReminderCallback = Arc<dyn Fn(DateTime<Utc>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async function as a [`ReminderCallback`].
pub fn reminder_callback<F, Fut>(f: F) -> ReminderCallback
where
    F: Fn(DateTime<Utc>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |now| -> BoxFuture<'static, ()> { Box::pin(f(now)) })
}

/// Six-field UTC cron expression firing daily at local time `at` in `offset`.
pub fn daily_cron(at: NaiveTime, offset: FixedOffset) -> String {
    let local_secs = i64::from(at.hour()) * 3600 + i64::from(at.minute()) * 60;
    let utc_secs = (local_secs - i64::from(offset.local_minus_utc())).rem_euclid(86_400);
    let hour = utc_secs / 3600;
    let minute = (utc_secs % 3600) / 60;
    format!("0 {minute} {hour} * * *")
}

/// Daily reminder scheduler.
pub struct ReminderScheduler {
    inner: Arc<RwLock<Option<JobScheduler>>>,
    jobs: Arc<RwLock<Vec<Uuid>>>,
}

impl ReminderScheduler {
    /// Create a new scheduler (not yet started).
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            jobs: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Start the scheduler. Must be called before scheduling reminders.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;

        scheduler
            .start()
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;

        let mut inner = self.inner.write().await;
        *inner = Some(scheduler);

        tracing::info!("reminder scheduler started");
        Ok(())
    }

    /// Stop the scheduler and drop all jobs.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let mut inner = self.inner.write().await;
        if let Some(mut scheduler) = inner.take() {
            scheduler
                .shutdown()
                .await
                .map_err(|e| SchedulerError::JobError(e.to_string()))?;
            tracing::info!("reminder scheduler stopped");
        }
        self.jobs.write().await.clear();
        Ok(())
    }

    /// Register `callback` to run every day at local time `at`.
    pub async fn schedule_daily(
        &self,
        at: NaiveTime,
        offset: FixedOffset,
        callback: ReminderCallback,
    ) -> Result<Uuid, SchedulerError> {
        let cron_expr = daily_cron(at, offset);

        let inner = self.inner.read().await;
        let scheduler = inner
            .as_ref()
            .ok_or_else(|| SchedulerError::JobError("scheduler not started".to_string()))?;

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let cb = callback.clone();
            Box::pin(async move {
                let now = Utc::now();
                tracing::debug!(%now, "daily reminder fired");
                cb(now).await;
            })
        })
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;

        let job_id = job.guid();
        scheduler
            .add(job)
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;
        self.jobs.write().await.push(job_id);

        tracing::info!(%job_id, cron = %cron_expr, local_time = %at, "daily reminder scheduled");
        Ok(job_id)
    }

    /// Number of registered reminder jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_daily_cron_shifts_positive_offset_back_a_day() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        assert_eq!(daily_cron(time(5, 0), offset), "0 0 22 * * *");
    }

    #[test]
    fn test_daily_cron_utc() {
        let offset = FixedOffset::east_opt(0).unwrap();
        assert_eq!(daily_cron(time(9, 30), offset), "0 30 9 * * *");
    }

    #[test]
    fn test_daily_cron_negative_offset_with_minutes() {
        let offset = FixedOffset::west_opt(3 * 3600 + 30 * 60).unwrap();
        assert_eq!(daily_cron(time(22, 45), offset), "0 15 2 * * *");
    }

    #[tokio::test]
    async fn test_scheduler_start_stop() {
        let scheduler = ReminderScheduler::new();
        scheduler.start().await.unwrap();
        assert_eq!(scheduler.job_count().await, 0);
        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_schedule_daily_registers_job() {
        let scheduler = ReminderScheduler::new();
        scheduler.start().await.unwrap();

        let cb = reminder_callback(|_now| async {});
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        scheduler.schedule_daily(time(5, 0), offset, cb).await.unwrap();
        assert_eq!(scheduler.job_count().await, 1);

        scheduler.stop().await.unwrap();
        assert_eq!(scheduler.job_count().await, 0);
    }

    #[tokio::test]
    async fn test_schedule_before_start_fails() {
        let scheduler = ReminderScheduler::new();
        let cb = reminder_callback(|_now| async {});
        let offset = FixedOffset::east_opt(0).unwrap();
        let result = scheduler.schedule_daily(time(5, 0), offset, cb).await;
        assert!(result.is_err());
    }
}
