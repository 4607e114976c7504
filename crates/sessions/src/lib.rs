//! Event-driven session lifecycle pipeline.
//!
//! Tracks authenticated sessions per device, detects prolonged inactivity,
//! deletes stale sessions without racing renewed activity, and keeps the
//! request-time revocation cache consistent with the durable store.
//!
//! Control flow: login → [`SessionTracker`] upserts the record and schedules
//! a deferred inactivity check → [`InactivityChecker`] either stops or
//! escalates → [`DeletionScheduler`] computes the absolute deletion time →
//! [`SessionReaper`] deletes transactionally. [`RevocationSync`] runs hourly
//! and [`CleanupBackfill`] reconciles checks after a deploy. All stages are
//! delivered at-least-once by the durable queue and re-read authoritative
//! state before acting.

pub mod backfill;
pub mod cache;
pub mod checker;
pub mod deletion;
pub mod error;
pub mod geo;
pub mod jobs;
pub mod queue;
pub mod reaper;
pub mod revocation_sync;
pub mod runner;
pub mod store;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use backfill::{BackfillReport, CleanupBackfill};
pub use cache::{InMemoryRevocationCache, RevocationCache};
pub use checker::{CheckerAction, InactivityChecker};
pub use deletion::DeletionScheduler;
pub use error::SessionError;
pub use geo::{GeoResolver, NoGeoResolver};
pub use jobs::SessionJob;
pub use queue::{JobScheduler, PgJobQueue};
pub use reaper::SessionReaper;
pub use revocation_sync::{run_ticker, RevocationSync, SyncReport};
pub use runner::JobRunner;
pub use store::{PgRevocationStore, PgSessionStore, RevocationStore, SessionStore};
pub use tracker::{MatchKind, SessionTracker, TrackOutcome};
