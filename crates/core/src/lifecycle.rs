//! Session lifecycle constants and decision functions.
//!
//! This module lives in `core` (zero internal deps) so it can be used by
//! both the repository layer and the pipeline handlers. Every timing
//! decision in the pipeline is judged against the `last_active_at` snapshot
//! captured when the job was scheduled, never against wall-clock "now" —
//! jobs may be delivered arbitrarily late and more than once.

use chrono::Duration;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Timing constants
// ---------------------------------------------------------------------------

/// A session is considered inactive after this many days without activity.
pub const INACTIVITY_THRESHOLD_DAYS: i64 = 1;

/// Grace period between the inactivity point and the actual deletion.
pub const DELETION_GRACE_DAYS: i64 = 3;

/// When the inactivity check for a session should run.
pub fn inactivity_deadline(last_active_at: Timestamp) -> Timestamp {
    last_active_at + Duration::days(INACTIVITY_THRESHOLD_DAYS)
}

/// Absolute deletion time for a session that went inactive at
/// `inactive_since`.
pub fn deletion_time(inactive_since: Timestamp) -> Timestamp {
    inactive_since + Duration::days(DELETION_GRACE_DAYS)
}

// ---------------------------------------------------------------------------
// Inactivity check decision
// ---------------------------------------------------------------------------

/// Outcome of re-evaluating a session at inactivity-check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The session was used again after the snapshot was taken.
    Reactivated,
    /// The session backs the client's live credential.
    CurrentSession,
    /// The session has not been used since the snapshot; escalate.
    StillInactive,
}

/// Decide what the inactivity checker should do for a live record.
///
/// `snapshot` is the `last_active_at` value observed when the check was
/// scheduled. The record absent case is handled by the caller.
pub fn evaluate_check(
    last_active_at: Timestamp,
    is_current_session: bool,
    snapshot: Timestamp,
) -> CheckOutcome {
    if last_active_at > snapshot {
        CheckOutcome::Reactivated
    } else if is_current_session {
        CheckOutcome::CurrentSession
    } else {
        CheckOutcome::StillInactive
    }
}

// ---------------------------------------------------------------------------
// Reap decision
// ---------------------------------------------------------------------------

/// Result of a reap attempt, reported as the job's `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
    /// The record no longer exists (already deleted or replaced).
    NoAction,
    /// The session became active again during the waiting window.
    SkippedActive,
    /// The record backs the client's live credential.
    SkippedCurrent,
    /// The record was deleted.
    Deleted,
}

impl ReapOutcome {
    /// Stable string form for structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ReapOutcome::NoAction => "no-action",
            ReapOutcome::SkippedActive => "skipped-active",
            ReapOutcome::SkippedCurrent => "skipped-current",
            ReapOutcome::Deleted => "deleted",
        }
    }
}

/// Decide whether a live record may be deleted.
///
/// `inactive_since` is the snapshot carried through the pipeline from the
/// original inactivity check. Any activity after that snapshot cancels the
/// deletion, regardless of how late the job is delivered.
pub fn evaluate_reap(
    last_active_at: Timestamp,
    is_current_session: bool,
    inactive_since: Timestamp,
) -> ReapOutcome {
    if last_active_at > inactive_since {
        ReapOutcome::SkippedActive
    } else if is_current_session {
        ReapOutcome::SkippedCurrent
    } else {
        ReapOutcome::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // Timing helpers
    // -----------------------------------------------------------------------

    #[test]
    fn inactivity_deadline_is_one_day_out() {
        let last = t(9);
        assert_eq!(inactivity_deadline(last), last + Duration::days(1));
    }

    #[test]
    fn deletion_time_is_three_days_from_the_snapshot() {
        let snapshot = t(9);
        assert_eq!(deletion_time(snapshot), snapshot + Duration::days(3));
    }

    // -----------------------------------------------------------------------
    // Check decision
    // -----------------------------------------------------------------------

    #[test]
    fn activity_after_snapshot_terminates_the_check() {
        assert_eq!(
            evaluate_check(t(12), false, t(9)),
            CheckOutcome::Reactivated
        );
    }

    #[test]
    fn current_session_is_never_escalated() {
        assert_eq!(
            evaluate_check(t(9), true, t(9)),
            CheckOutcome::CurrentSession
        );
    }

    #[test]
    fn untouched_snapshot_escalates() {
        assert_eq!(
            evaluate_check(t(9), false, t(9)),
            CheckOutcome::StillInactive
        );
    }

    #[test]
    fn reactivation_wins_over_current_session() {
        // A current session that was also used again terminates as
        // reactivated; either way nothing escalates.
        assert_eq!(evaluate_check(t(12), true, t(9)), CheckOutcome::Reactivated);
    }

    // -----------------------------------------------------------------------
    // Reap decision
    // -----------------------------------------------------------------------

    #[test]
    fn activity_after_snapshot_cancels_deletion() {
        assert_eq!(
            evaluate_reap(t(10), false, t(9)),
            ReapOutcome::SkippedActive
        );
    }

    #[test]
    fn current_session_is_never_deleted() {
        // Even a snapshot ten days stale must not delete the live session.
        let snapshot = t(9) - Duration::days(10);
        assert_eq!(
            evaluate_reap(snapshot, true, snapshot),
            ReapOutcome::SkippedCurrent
        );
    }

    #[test]
    fn stale_non_current_record_is_deleted() {
        assert_eq!(evaluate_reap(t(9), false, t(9)), ReapOutcome::Deleted);
    }

    #[test]
    fn reap_outcome_log_strings() {
        assert_eq!(ReapOutcome::NoAction.as_str(), "no-action");
        assert_eq!(ReapOutcome::SkippedActive.as_str(), "skipped-active");
        assert_eq!(ReapOutcome::SkippedCurrent.as_str(), "skipped-current");
        assert_eq!(ReapOutcome::Deleted.as_str(), "deleted");
    }
}
