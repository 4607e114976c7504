//! Job types and payloads flowing through the durable queue.
//!
//! Each job is persisted as a `job_type` string plus a JSONB payload, so
//! payload structs must stay backward-compatible across deploys.

use casetrace_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// Upsert a session record from an authentication event.
pub const JOB_TRACK: &str = "session.track";
/// Re-evaluate a session against its schedule-time activity snapshot.
pub const JOB_CHECK_INACTIVITY: &str = "session.check-inactivity";
/// Compute the absolute deletion time for an inactive session.
pub const JOB_SCHEDULE_DELETION: &str = "session.schedule-deletion";
/// Transactionally delete a stale session.
pub const JOB_DELETE: &str = "session.delete";
/// Republish active revocations into the cache.
pub const JOB_SYNC_REVOCATIONS: &str = "session.sync-revocations";
/// Backfill inactivity checks for every existing session record.
pub const JOB_TRIGGER_CLEANUP: &str = "session.trigger-cleanup";

/// Payload for [`JOB_TRACK`], supplied by the credential-issuance system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSession {
    pub user_id: DbId,
    pub session_token: String,
    pub user_agent: String,
    pub ip_address: String,
}

/// Payload for [`JOB_CHECK_INACTIVITY`]. `last_active_at` is the snapshot
/// observed at schedule time; the checker judges inactivity against it, not
/// against "now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInactivity {
    pub session_token: String,
    pub user_id: DbId,
    pub last_active_at: Timestamp,
}

/// Payload for [`JOB_SCHEDULE_DELETION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDeletion {
    pub session_token: String,
    pub user_id: DbId,
    pub inactive_since: Timestamp,
}

/// Payload for [`JOB_DELETE`]. Carries the original inactivity snapshot so
/// the reaper's safety check uses the same reference point as the checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSession {
    pub session_token: String,
    pub user_id: DbId,
    pub inactive_since: Timestamp,
}

/// A session lifecycle job, as dispatched by the runner.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionJob {
    Track(TrackSession),
    CheckInactivity(CheckInactivity),
    ScheduleDeletion(ScheduleDeletion),
    Delete(DeleteSession),
    SyncRevocations,
    TriggerCleanup,
}

/// A persisted job row could not be turned back into a [`SessionJob`].
#[derive(Debug, thiserror::Error)]
pub enum JobDecodeError {
    #[error("Unknown job type: {0}")]
    UnknownType(String),

    #[error("Invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl SessionJob {
    /// The `job_type` column value for this job.
    pub fn job_type(&self) -> &'static str {
        match self {
            SessionJob::Track(_) => JOB_TRACK,
            SessionJob::CheckInactivity(_) => JOB_CHECK_INACTIVITY,
            SessionJob::ScheduleDeletion(_) => JOB_SCHEDULE_DELETION,
            SessionJob::Delete(_) => JOB_DELETE,
            SessionJob::SyncRevocations => JOB_SYNC_REVOCATIONS,
            SessionJob::TriggerCleanup => JOB_TRIGGER_CLEANUP,
        }
    }

    /// Serialize the payload for persistence. Payload-less jobs store an
    /// empty object.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            SessionJob::Track(p) => serde_json::to_value(p),
            SessionJob::CheckInactivity(p) => serde_json::to_value(p),
            SessionJob::ScheduleDeletion(p) => serde_json::to_value(p),
            SessionJob::Delete(p) => serde_json::to_value(p),
            SessionJob::SyncRevocations | SessionJob::TriggerCleanup => {
                Ok(serde_json::Value::Object(Default::default()))
            }
        }
    }

    /// Reconstruct a job from its persisted `job_type` and payload.
    pub fn from_parts(
        job_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Self, JobDecodeError> {
        let job = match job_type {
            JOB_TRACK => SessionJob::Track(serde_json::from_value(payload.clone())?),
            JOB_CHECK_INACTIVITY => {
                SessionJob::CheckInactivity(serde_json::from_value(payload.clone())?)
            }
            JOB_SCHEDULE_DELETION => {
                SessionJob::ScheduleDeletion(serde_json::from_value(payload.clone())?)
            }
            JOB_DELETE => SessionJob::Delete(serde_json::from_value(payload.clone())?),
            JOB_SYNC_REVOCATIONS => SessionJob::SyncRevocations,
            JOB_TRIGGER_CLEANUP => SessionJob::TriggerCleanup,
            other => return Err(JobDecodeError::UnknownType(other.to_string())),
        };
        Ok(job)
    }

    /// Session token and user id for failure-hook logging, where the job
    /// targets a specific session.
    pub fn session_context(&self) -> (Option<&str>, Option<DbId>) {
        match self {
            SessionJob::Track(p) => (Some(&p.session_token), Some(p.user_id)),
            SessionJob::CheckInactivity(p) => (Some(&p.session_token), Some(p.user_id)),
            SessionJob::ScheduleDeletion(p) => (Some(&p.session_token), Some(p.user_id)),
            SessionJob::Delete(p) => (Some(&p.session_token), Some(p.user_id)),
            SessionJob::SyncRevocations | SessionJob::TriggerCleanup => (None, None),
        }
    }
}
