//! Durable job scheduling seam and its Postgres implementation.

use async_trait::async_trait;
use casetrace_core::types::{DbId, Timestamp};
use casetrace_db::models::queued_job::QueuedJob;
use casetrace_db::repositories::SessionJobRepo;
use casetrace_db::DbPool;
use chrono::Utc;

use crate::jobs::SessionJob;

/// Errors from enqueueing a job.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Used by non-Postgres implementations (tests, future backends).
    #[error("Scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Injectable scheduling interface so handlers stay unit-testable without a
/// real queue. `not_before = None` means dispatch as soon as possible.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    async fn enqueue(
        &self,
        job: &SessionJob,
        not_before: Option<Timestamp>,
    ) -> Result<(), ScheduleError>;
}

/// Postgres-backed durable queue over the `session_jobs` table.
///
/// Delivery is at-least-once: handlers must re-read authoritative state
/// before acting.
pub struct PgJobQueue {
    pool: DbPool,
}

impl PgJobQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Claim the next due job, if any. Increments the attempt counter.
    pub async fn claim_due(&self) -> Result<Option<QueuedJob>, sqlx::Error> {
        SessionJobRepo::claim_due(&self.pool, Utc::now()).await
    }

    /// Mark a claimed job as completed.
    pub async fn complete(&self, id: DbId) -> Result<(), sqlx::Error> {
        SessionJobRepo::complete(&self.pool, id).await
    }

    /// Return a claimed job to the queue for another attempt.
    pub async fn retry(&self, id: DbId, error: &str, run_at: Timestamp) -> Result<(), sqlx::Error> {
        SessionJobRepo::retry(&self.pool, id, error, run_at).await
    }

    /// Mark a claimed job as terminally failed.
    pub async fn fail(&self, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        SessionJobRepo::fail(&self.pool, id, error).await
    }
}

#[async_trait]
impl JobScheduler for PgJobQueue {
    async fn enqueue(
        &self,
        job: &SessionJob,
        not_before: Option<Timestamp>,
    ) -> Result<(), ScheduleError> {
        let payload = job.payload()?;
        let run_at = not_before.unwrap_or_else(Utc::now);
        SessionJobRepo::enqueue(&self.pool, job.job_type(), &payload, run_at).await?;
        Ok(())
    }
}
