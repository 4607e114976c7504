//! Job runner: polls the durable queue and dispatches to the handlers.
//!
//! Delivery is at-least-once with a capped retry budget. The attempt
//! counter is incremented at claim time, so a job that crashes the process
//! mid-flight still burns an attempt and cannot loop forever.

use std::sync::Arc;
use std::time::Duration;

use casetrace_db::models::queued_job::QueuedJob;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::backfill::CleanupBackfill;
use crate::checker::InactivityChecker;
use crate::deletion::DeletionScheduler;
use crate::error::SessionError;
use crate::jobs::SessionJob;
use crate::queue::PgJobQueue;
use crate::reaper::SessionReaper;
use crate::revocation_sync::RevocationSync;
use crate::tracker::SessionTracker;

/// A job is terminally failed once it has been claimed this many times.
pub const MAX_ATTEMPTS: i32 = 2;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const RETRY_DELAY: chrono::Duration = chrono::Duration::seconds(30);

/// What to do with a claimed job whose handler returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureDisposition {
    /// Return the job to the queue, due at the given time.
    Retry(casetrace_core::types::Timestamp),
    /// The attempt budget is spent; mark the job failed.
    Terminal,
}

fn failure_disposition(
    attempts: i32,
    now: casetrace_core::types::Timestamp,
) -> FailureDisposition {
    if attempts >= MAX_ATTEMPTS {
        FailureDisposition::Terminal
    } else {
        FailureDisposition::Retry(now + RETRY_DELAY)
    }
}

/// Owns the handler set and drives the queue until cancelled.
pub struct JobRunner {
    queue: Arc<PgJobQueue>,
    tracker: SessionTracker,
    checker: InactivityChecker,
    deletion: DeletionScheduler,
    reaper: SessionReaper,
    sync: RevocationSync,
    backfill: CleanupBackfill,
}

impl JobRunner {
    pub fn new(
        queue: Arc<PgJobQueue>,
        tracker: SessionTracker,
        checker: InactivityChecker,
        deletion: DeletionScheduler,
        reaper: SessionReaper,
        sync: RevocationSync,
        backfill: CleanupBackfill,
    ) -> Self {
        Self {
            queue,
            tracker,
            checker,
            deletion,
            reaper,
            sync,
            backfill,
        }
    }

    /// Poll loop. Drains all due jobs each tick, then sleeps.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!("Job runner started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job runner stopped");
                    return;
                }
                _ = interval.tick() => {
                    self.drain_due(&cancel).await;
                }
            }
        }
    }

    async fn drain_due(&self, cancel: &CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }
            let claimed = match self.queue.claim_due().await {
                Ok(Some(job)) => job,
                Ok(None) => return,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to claim a job");
                    return;
                }
            };
            self.execute(claimed).await;
        }
    }

    async fn execute(&self, claimed: QueuedJob) {
        let job = match SessionJob::from_parts(&claimed.job_type, &claimed.payload) {
            Ok(job) => job,
            Err(e) => {
                // An undecodable payload will never decode on retry.
                tracing::error!(
                    job_id = claimed.id,
                    job_type = %claimed.job_type,
                    error = %e,
                    "Dropping undecodable job"
                );
                if let Err(e) = self.queue.fail(claimed.id, &e.to_string()).await {
                    tracing::error!(job_id = claimed.id, error = %e, "Failed to mark job failed");
                }
                return;
            }
        };

        tracing::debug!(
            job_id = claimed.id,
            job_type = %claimed.job_type,
            attempt = claimed.attempts,
            "Executing job"
        );

        match self.dispatch(&job).await {
            Ok(()) => {
                if let Err(e) = self.queue.complete(claimed.id).await {
                    tracing::error!(job_id = claimed.id, error = %e, "Failed to mark job completed");
                }
            }
            Err(e) => self.handle_failure(&claimed, &job, e).await,
        }
    }

    async fn dispatch(&self, job: &SessionJob) -> Result<(), SessionError> {
        match job {
            SessionJob::Track(payload) => {
                self.tracker.track(payload).await?;
            }
            SessionJob::CheckInactivity(payload) => {
                self.checker.handle(payload).await?;
            }
            SessionJob::ScheduleDeletion(payload) => {
                self.deletion.handle(payload).await?;
            }
            SessionJob::Delete(payload) => {
                self.reaper.handle(payload).await?;
            }
            SessionJob::SyncRevocations => {
                self.sync.run_once().await?;
            }
            SessionJob::TriggerCleanup => {
                self.backfill.run().await?;
            }
        }
        Ok(())
    }

    async fn handle_failure(&self, claimed: &QueuedJob, job: &SessionJob, error: SessionError) {
        match failure_disposition(claimed.attempts, Utc::now()) {
            FailureDisposition::Terminal => {
                let (session_token, user_id) = job.session_context();
                tracing::error!(
                    job_id = claimed.id,
                    job_type = %claimed.job_type,
                    attempts = claimed.attempts,
                    session_token,
                    user_id,
                    error = %error,
                    "Job failed terminally"
                );
                if let Err(e) = self.queue.fail(claimed.id, &error.to_string()).await {
                    tracing::error!(job_id = claimed.id, error = %e, "Failed to mark job failed");
                }
            }
            FailureDisposition::Retry(run_at) => {
                tracing::warn!(
                    job_id = claimed.id,
                    job_type = %claimed.job_type,
                    attempts = claimed.attempts,
                    error = %error,
                    "Job failed, retrying"
                );
                if let Err(e) = self
                    .queue
                    .retry(claimed.id, &error.to_string(), run_at)
                    .await
                {
                    tracing::error!(job_id = claimed.id, error = %e, "Failed to requeue job");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn first_failure_is_retried_after_the_delay() {
        let now = Utc::now();
        // attempts = 1 after the first claim
        assert_eq!(
            failure_disposition(1, now),
            FailureDisposition::Retry(now + RETRY_DELAY)
        );
    }

    #[test]
    fn second_failure_is_terminal() {
        assert_matches!(
            failure_disposition(MAX_ATTEMPTS, Utc::now()),
            FailureDisposition::Terminal
        );
        assert_matches!(
            failure_disposition(MAX_ATTEMPTS + 1, Utc::now()),
            FailureDisposition::Terminal
        );
    }
}
