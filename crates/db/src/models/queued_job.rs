//! Durable job queue model.

use casetrace_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Queue row status: waiting for its `run_at` time.
pub const JOB_STATUS_PENDING: &str = "pending";
/// Queue row status: claimed by a runner.
pub const JOB_STATUS_RUNNING: &str = "running";
/// Queue row status: handler finished successfully.
pub const JOB_STATUS_COMPLETED: &str = "completed";
/// Queue row status: all attempts exhausted.
pub const JOB_STATUS_FAILED: &str = "failed";

/// A row from the `session_jobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct QueuedJob {
    pub id: DbId,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub run_at: Timestamp,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}
