//! Revocation cache synchronization.
//!
//! The durable `revoked_tokens` table is the source of truth; the in-process
//! cache is rebuilt from it wholesale on every sync. A full replace rather
//! than a diff keeps the cache self-healing after any missed update.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::cache::RevocationCache;
use crate::error::SessionError;
use crate::jobs::SessionJob;
use crate::queue::JobScheduler;
use crate::store::RevocationStore;

/// What one sync pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Unexpired tokens now in the cache.
    pub synced_count: usize,
    /// Expired rows removed from the durable store.
    pub purged_count: u64,
}

/// Handler for `session.sync-revocations` jobs.
pub struct RevocationSync {
    store: Arc<dyn RevocationStore>,
    cache: Arc<dyn RevocationCache>,
}

impl RevocationSync {
    pub fn new(store: Arc<dyn RevocationStore>, cache: Arc<dyn RevocationCache>) -> Self {
        Self { store, cache }
    }

    /// Run one full sync pass. A cache write failure is an error so the job
    /// runner retries it; a stale revocation cache is a security problem,
    /// not a cosmetic one.
    pub async fn run_once(&self) -> Result<SyncReport, SessionError> {
        let now = Utc::now();
        let tokens = self.store.active_tokens(now).await?;
        let synced_count = tokens.len();
        self.cache.replace_all(tokens).await?;
        let purged_count = self.store.purge_expired(now).await?;

        tracing::info!(synced_count, purged_count, "Revocation cache synced");
        Ok(SyncReport {
            synced_count,
            purged_count,
        })
    }
}

/// Periodically enqueue a sync job until cancelled.
///
/// The tick enqueues into the durable queue instead of syncing inline so
/// that a failed sync inherits the queue's retry behavior.
pub async fn run_ticker(
    scheduler: Arc<dyn JobScheduler>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(period_secs = period.as_secs(), "Revocation sync ticker started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Revocation sync ticker stopped");
                return;
            }
            _ = interval.tick() => {
                if let Err(e) = scheduler.enqueue(&SessionJob::SyncRevocations, None).await {
                    tracing::warn!(error = %e, "Failed to enqueue revocation sync");
                }
            }
        }
    }
}
