//! Deletion scheduling: the grace-period stage between a confirmed
//! inactivity check and the actual reap.

use std::sync::Arc;

use casetrace_core::lifecycle;
use casetrace_core::types::Timestamp;

use crate::error::SessionError;
use crate::jobs::{DeleteSession, ScheduleDeletion, SessionJob};
use crate::queue::JobScheduler;

/// Handler for `session.schedule-deletion` jobs.
pub struct DeletionScheduler {
    scheduler: Arc<dyn JobScheduler>,
}

impl DeletionScheduler {
    pub fn new(scheduler: Arc<dyn JobScheduler>) -> Self {
        Self { scheduler }
    }

    /// Enqueue the final delete for three days after the inactivity
    /// snapshot. Returns the scheduled deletion time.
    pub async fn handle(&self, job: &ScheduleDeletion) -> Result<Timestamp, SessionError> {
        let deletion_time = lifecycle::deletion_time(job.inactive_since);
        self.scheduler
            .enqueue(
                &SessionJob::Delete(DeleteSession {
                    session_token: job.session_token.clone(),
                    user_id: job.user_id,
                    inactive_since: job.inactive_since,
                }),
                Some(deletion_time),
            )
            .await?;

        tracing::info!(
            user_id = job.user_id,
            deletion_time = %deletion_time,
            "Scheduled session deletion"
        );
        Ok(deletion_time)
    }
}
