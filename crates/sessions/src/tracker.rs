//! Session tracker: upserts a session record on every authentication event.
//!
//! Device identity is resolved with a three-way match, first match wins:
//! exact token (Case A), device fingerprint with a rotated token (Case B),
//! or a fresh insert (Case C). After the record is settled the tracker
//! schedules the deferred inactivity check; that side effect is
//! fire-and-forget because the authentication flow must never be blocked by
//! a background-scheduling outage.

use std::sync::Arc;

use casetrace_core::crypto::IpCipher;
use casetrace_core::lifecycle;
use casetrace_core::types::DbId;
use casetrace_core::user_agent;
use casetrace_db::models::device_session::NewDeviceSession;
use chrono::Utc;

use crate::error::SessionError;
use crate::geo::GeoResolver;
use crate::jobs::{CheckInactivity, SessionJob, TrackSession};
use crate::queue::JobScheduler;
use crate::store::SessionStore;

/// How an authentication event was matched to a session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Case A: a record with this exact token already existed.
    ExactToken,
    /// Case B: same user and device attributes, credential was rotated.
    DeviceFingerprint,
    /// Case C: first sighting of this device.
    NewDevice,
}

/// Result of a successful tracking call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutcome {
    pub session_id: DbId,
    pub matched: MatchKind,
}

/// Upserts session records from authentication events.
pub struct SessionTracker {
    store: Arc<dyn SessionStore>,
    scheduler: Arc<dyn JobScheduler>,
    geo: Arc<dyn GeoResolver>,
    cipher: IpCipher,
    /// Disabled outside production-equivalent environments so test runs do
    /// not accumulate deferred jobs.
    schedule_checks: bool,
}

impl SessionTracker {
    pub fn new(
        store: Arc<dyn SessionStore>,
        scheduler: Arc<dyn JobScheduler>,
        geo: Arc<dyn GeoResolver>,
        cipher: IpCipher,
        schedule_checks: bool,
    ) -> Self {
        Self {
            store,
            scheduler,
            geo,
            cipher,
            schedule_checks,
        }
    }

    /// Track one authentication event.
    ///
    /// Errors only if parsing, encryption, or the primary upsert fails;
    /// the inactivity-check scheduling failure is logged as a warning and
    /// swallowed.
    pub async fn track(&self, input: &TrackSession) -> Result<TrackOutcome, SessionError> {
        let now = Utc::now();
        let fingerprint = user_agent::parse(&input.user_agent);
        let location = self.geo.resolve(&input.ip_address);
        let ip_address_enc = Some(self.cipher.encrypt(&input.ip_address)?);

        let (session_id, matched) = if let Some(existing) =
            self.store.find_by_token(&input.session_token).await?
        {
            self.store
                .touch(existing.id, ip_address_enc.as_deref(), location.as_deref(), now)
                .await?;
            (existing.id, MatchKind::ExactToken)
        } else if let Some(existing) = self
            .store
            .find_device_match(input.user_id, &fingerprint)
            .await?
        {
            self.store
                .rotate_token(
                    existing.id,
                    &input.session_token,
                    ip_address_enc.as_deref(),
                    location.as_deref(),
                    now,
                )
                .await?;
            (existing.id, MatchKind::DeviceFingerprint)
        } else {
            let created = self
                .store
                .insert(NewDeviceSession {
                    user_id: input.user_id,
                    session_token: input.session_token.clone(),
                    fingerprint,
                    ip_address_enc,
                    location,
                    last_active_at: now,
                })
                .await?;
            (created.id, MatchKind::NewDevice)
        };

        tracing::debug!(session_id, user_id = input.user_id, matched = ?matched, "Session tracked");

        if self.schedule_checks {
            let job = SessionJob::CheckInactivity(CheckInactivity {
                session_token: input.session_token.clone(),
                user_id: input.user_id,
                last_active_at: now,
            });
            let deadline = lifecycle::inactivity_deadline(now);
            if let Err(e) = self.scheduler.enqueue(&job, Some(deadline)).await {
                tracing::warn!(
                    error = %e,
                    session_id,
                    user_id = input.user_id,
                    "Failed to schedule inactivity check"
                );
            }
        }

        Ok(TrackOutcome {
            session_id,
            matched,
        })
    }
}
