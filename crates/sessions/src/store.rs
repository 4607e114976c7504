//! Durable store seams for the pipeline handlers.
//!
//! Handlers depend on these traits rather than on sqlx directly so they can
//! be unit tested against in-memory fakes. The Postgres implementations
//! delegate to the repository layer; the reaper's read-then-delete runs in
//! one transaction inside [`DeviceSessionRepo::reap`], so callers never see
//! a transaction handle.

use async_trait::async_trait;
use casetrace_core::lifecycle::ReapOutcome;
use casetrace_core::types::{DbId, Timestamp};
use casetrace_core::user_agent::DeviceFingerprint;
use casetrace_db::models::device_session::{DeviceSession, NewDeviceSession};
use casetrace_db::repositories::{DeviceSessionRepo, RevokedTokenRepo};
use casetrace_db::DbPool;

/// Errors from the durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Used by non-Postgres implementations (tests, future backends).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistent session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_by_token(&self, session_token: &str)
        -> Result<Option<DeviceSession>, StoreError>;

    async fn find_device_match(
        &self,
        user_id: DbId,
        fingerprint: &DeviceFingerprint,
    ) -> Result<Option<DeviceSession>, StoreError>;

    /// Advance `last_active_at` (monotonically) and refresh the encrypted
    /// IP and location in place.
    async fn touch(
        &self,
        id: DbId,
        ip_address_enc: Option<&str>,
        location: Option<&str>,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    /// Point the row at a rotated credential and advance `last_active_at`.
    async fn rotate_token(
        &self,
        id: DbId,
        new_token: &str,
        ip_address_enc: Option<&str>,
        location: Option<&str>,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    async fn insert(&self, session: NewDeviceSession) -> Result<DeviceSession, StoreError>;

    async fn list_all(&self) -> Result<Vec<DeviceSession>, StoreError>;

    /// Atomically re-verify and delete a stale session. Safe under
    /// duplicate delivery: a second call reports [`ReapOutcome::NoAction`].
    async fn reap(
        &self,
        session_token: &str,
        inactive_since: Timestamp,
    ) -> Result<ReapOutcome, StoreError>;
}

/// Persistent revoked-token records.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Tokens whose revocation is still in force at `now`.
    async fn active_tokens(&self, now: Timestamp) -> Result<Vec<String>, StoreError>;

    /// Remove rows past their expiry. Independent of the cache.
    async fn purge_expired(&self, now: Timestamp) -> Result<u64, StoreError>;
}

/// Postgres-backed [`SessionStore`].
pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find_by_token(
        &self,
        session_token: &str,
    ) -> Result<Option<DeviceSession>, StoreError> {
        Ok(DeviceSessionRepo::find_by_token(&self.pool, session_token).await?)
    }

    async fn find_device_match(
        &self,
        user_id: DbId,
        fingerprint: &DeviceFingerprint,
    ) -> Result<Option<DeviceSession>, StoreError> {
        Ok(DeviceSessionRepo::find_device_match(&self.pool, user_id, fingerprint).await?)
    }

    async fn touch(
        &self,
        id: DbId,
        ip_address_enc: Option<&str>,
        location: Option<&str>,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        Ok(DeviceSessionRepo::touch(&self.pool, id, ip_address_enc, location, now).await?)
    }

    async fn rotate_token(
        &self,
        id: DbId,
        new_token: &str,
        ip_address_enc: Option<&str>,
        location: Option<&str>,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        Ok(DeviceSessionRepo::rotate_token(
            &self.pool,
            id,
            new_token,
            ip_address_enc,
            location,
            now,
        )
        .await?)
    }

    async fn insert(&self, session: NewDeviceSession) -> Result<DeviceSession, StoreError> {
        Ok(DeviceSessionRepo::create(&self.pool, &session).await?)
    }

    async fn list_all(&self) -> Result<Vec<DeviceSession>, StoreError> {
        Ok(DeviceSessionRepo::list_all(&self.pool).await?)
    }

    async fn reap(
        &self,
        session_token: &str,
        inactive_since: Timestamp,
    ) -> Result<ReapOutcome, StoreError> {
        Ok(DeviceSessionRepo::reap(&self.pool, session_token, inactive_since).await?)
    }
}

/// Postgres-backed [`RevocationStore`].
pub struct PgRevocationStore {
    pool: DbPool,
}

impl PgRevocationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn active_tokens(&self, now: Timestamp) -> Result<Vec<String>, StoreError> {
        Ok(RevokedTokenRepo::list_active(&self.pool, now).await?)
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        Ok(RevokedTokenRepo::purge_expired(&self.pool, now).await?)
    }
}
