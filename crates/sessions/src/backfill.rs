//! Operator-triggered cleanup backfill.
//!
//! Seeds an inactivity check for every existing session. Used after
//! deploying the lifecycle pipeline to a store that predates it, or after a
//! queue wipe, so no session escapes the cleanup chain.

use std::sync::Arc;

use casetrace_core::lifecycle;
use chrono::Utc;

use crate::error::SessionError;
use crate::jobs::{CheckInactivity, SessionJob};
use crate::queue::JobScheduler;
use crate::store::SessionStore;

/// Summary of a backfill pass.
#[derive(Debug, Default)]
pub struct BackfillReport {
    pub scheduled_count: usize,
    pub total_sessions: usize,
    pub errors: Vec<String>,
}

/// Handler for `session.trigger-cleanup` jobs.
pub struct CleanupBackfill {
    store: Arc<dyn SessionStore>,
    scheduler: Arc<dyn JobScheduler>,
}

impl CleanupBackfill {
    pub fn new(store: Arc<dyn SessionStore>, scheduler: Arc<dyn JobScheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Schedule a check for every session. Per-session enqueue failures are
    /// collected rather than aborting the sweep; checks for already-overdue
    /// sessions run immediately.
    pub async fn run(&self) -> Result<BackfillReport, SessionError> {
        let sessions = self.store.list_all().await?;
        let now = Utc::now();
        let mut report = BackfillReport {
            total_sessions: sessions.len(),
            ..Default::default()
        };

        for session in &sessions {
            let deadline = lifecycle::inactivity_deadline(session.last_active_at);
            let not_before = (deadline > now).then_some(deadline);
            let job = SessionJob::CheckInactivity(CheckInactivity {
                session_token: session.session_token.clone(),
                user_id: session.user_id,
                last_active_at: session.last_active_at,
            });
            match self.scheduler.enqueue(&job, not_before).await {
                Ok(()) => report.scheduled_count += 1,
                Err(e) => report.errors.push(format!("session {}: {e}", session.id)),
            }
        }

        tracing::info!(
            scheduled_count = report.scheduled_count,
            total_sessions = report.total_sessions,
            error_count = report.errors.len(),
            "Cleanup backfill finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session_row, InMemorySessionStore, RecordingScheduler};
    use casetrace_core::user_agent::DeviceFingerprint;
    use chrono::Duration;

    #[tokio::test]
    async fn overdue_sessions_are_checked_immediately_and_fresh_ones_deferred() {
        let store = Arc::new(InMemorySessionStore::new());
        let fp = DeviceFingerprint::default();
        let now = Utc::now();
        store.seed(session_row(1, "stale", &fp, now - Duration::days(5)));
        let fresh_at = now - Duration::hours(2);
        store.seed(session_row(2, "fresh", &fp, fresh_at));

        let scheduler = Arc::new(RecordingScheduler::new());
        let backfill = CleanupBackfill::new(store, scheduler.clone());
        let report = backfill.run().await.unwrap();

        assert_eq!(report.scheduled_count, 2);
        assert_eq!(report.total_sessions, 2);
        assert!(report.errors.is_empty());

        for (job, not_before) in scheduler.calls() {
            let SessionJob::CheckInactivity(payload) = job else {
                panic!("expected a check-inactivity job, got {job:?}");
            };
            match payload.session_token.as_str() {
                "stale" => assert!(not_before.is_none()),
                "fresh" => {
                    assert_eq!(not_before, Some(lifecycle::inactivity_deadline(fresh_at)));
                }
                other => panic!("unexpected session token {other}"),
            }
        }
    }

    #[tokio::test]
    async fn enqueue_failures_are_collected_not_fatal() {
        let store = Arc::new(InMemorySessionStore::new());
        let fp = DeviceFingerprint::default();
        store.seed(session_row(1, "a", &fp, Utc::now()));
        store.seed(session_row(2, "b", &fp, Utc::now()));

        let backfill = CleanupBackfill::new(store, Arc::new(RecordingScheduler::failing()));
        let report = backfill.run().await.unwrap();

        assert_eq!(report.scheduled_count, 0);
        assert_eq!(report.errors.len(), 2);
    }

    #[tokio::test]
    async fn empty_store_is_a_clean_pass() {
        let store = Arc::new(InMemorySessionStore::new());
        let scheduler = Arc::new(RecordingScheduler::new());
        let backfill = CleanupBackfill::new(store, scheduler.clone());
        let report = backfill.run().await.unwrap();

        assert_eq!(report.total_sessions, 0);
        assert!(scheduler.calls().is_empty());
    }
}
