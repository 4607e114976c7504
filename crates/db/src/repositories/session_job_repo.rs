//! Repository for the `session_jobs` durable queue.
//!
//! The queue provides at-least-once delivery: a crashed runner leaves a row
//! in `running` that operations can re-enqueue, and `claim_due` uses
//! `SELECT FOR UPDATE SKIP LOCKED` so concurrent runners never claim the
//! same row twice.

use casetrace_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::queued_job::{
    QueuedJob, JOB_STATUS_COMPLETED, JOB_STATUS_FAILED, JOB_STATUS_PENDING, JOB_STATUS_RUNNING,
};

const COLUMNS: &str =
    "id, job_type, payload, status, run_at, attempts, last_error, created_at, completed_at";

/// Provides queue operations for session lifecycle jobs.
pub struct SessionJobRepo;

impl SessionJobRepo {
    /// Enqueue a job to run at `run_at` (which may be in the past for
    /// immediate dispatch).
    pub async fn enqueue(
        pool: &PgPool,
        job_type: &str,
        payload: &serde_json::Value,
        run_at: Timestamp,
    ) -> Result<QueuedJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO session_jobs (job_type, payload, run_at) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueuedJob>(&query)
            .bind(job_type)
            .bind(payload)
            .bind(run_at)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the next due pending job, incrementing its attempt
    /// counter.
    pub async fn claim_due(pool: &PgPool, now: Timestamp) -> Result<Option<QueuedJob>, sqlx::Error> {
        let query = format!(
            "UPDATE session_jobs \
             SET status = $1, attempts = attempts + 1 \
             WHERE id = ( \
                 SELECT id FROM session_jobs \
                 WHERE status = $2 AND run_at <= $3 \
                 ORDER BY run_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueuedJob>(&query)
            .bind(JOB_STATUS_RUNNING)
            .bind(JOB_STATUS_PENDING)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Mark a claimed job as completed.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE session_jobs SET status = $2, completed_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(JOB_STATUS_COMPLETED)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Return a claimed job to the queue for another attempt at `run_at`.
    pub async fn retry(
        pool: &PgPool,
        id: DbId,
        error: &str,
        run_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE session_jobs SET status = $2, last_error = $3, run_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(JOB_STATUS_PENDING)
        .bind(error)
        .bind(run_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a claimed job as terminally failed.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE session_jobs \
             SET status = $2, last_error = $3, completed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(JOB_STATUS_FAILED)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }
}
