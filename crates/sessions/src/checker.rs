//! Deferred inactivity check.
//!
//! Runs roughly one day after the activity snapshot it was scheduled with.
//! The handler re-reads the authoritative session record and only escalates
//! to deletion scheduling when the session has genuinely been idle the whole
//! time and is not the device's current session.

use std::sync::Arc;

use casetrace_core::lifecycle::{self, CheckOutcome};

use crate::error::SessionError;
use crate::jobs::{CheckInactivity, ScheduleDeletion, SessionJob};
use crate::queue::JobScheduler;
use crate::store::SessionStore;

/// What the check decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerAction {
    /// The session was deleted or never existed; nothing to do.
    Missing,
    /// Activity was recorded after the snapshot; the chain ends here.
    Reactivated,
    /// The device's current session is exempt from inactivity escalation.
    CurrentSession,
    /// Still idle: a deletion-scheduling job was enqueued.
    Escalated,
}

/// Handler for `session.check-inactivity` jobs.
pub struct InactivityChecker {
    store: Arc<dyn SessionStore>,
    scheduler: Arc<dyn JobScheduler>,
}

impl InactivityChecker {
    pub fn new(store: Arc<dyn SessionStore>, scheduler: Arc<dyn JobScheduler>) -> Self {
        Self { store, scheduler }
    }

    pub async fn handle(&self, job: &CheckInactivity) -> Result<CheckerAction, SessionError> {
        let Some(record) = self.store.find_by_token(&job.session_token).await? else {
            tracing::debug!(user_id = job.user_id, "Inactivity check found no session");
            return Ok(CheckerAction::Missing);
        };

        let action = match lifecycle::evaluate_check(
            record.last_active_at,
            record.is_current_session,
            job.last_active_at,
        ) {
            CheckOutcome::Reactivated => CheckerAction::Reactivated,
            CheckOutcome::CurrentSession => CheckerAction::CurrentSession,
            CheckOutcome::StillInactive => {
                // The original snapshot stays the reference point for the
                // rest of the chain.
                self.scheduler
                    .enqueue(
                        &SessionJob::ScheduleDeletion(ScheduleDeletion {
                            session_token: job.session_token.clone(),
                            user_id: job.user_id,
                            inactive_since: job.last_active_at,
                        }),
                        None,
                    )
                    .await?;
                CheckerAction::Escalated
            }
        };

        tracing::debug!(
            session_id = record.id,
            user_id = job.user_id,
            action = ?action,
            "Inactivity check evaluated"
        );
        Ok(action)
    }
}
