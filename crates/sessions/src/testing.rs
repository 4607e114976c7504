//! In-memory fakes of the store/scheduler/cache seams for handler tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use casetrace_core::lifecycle::{self, ReapOutcome};
use casetrace_core::types::{DbId, Timestamp};
use casetrace_core::user_agent::DeviceFingerprint;
use casetrace_db::models::device_session::{DeviceSession, NewDeviceSession};

use crate::cache::{CacheError, RevocationCache};
use crate::jobs::SessionJob;
use crate::queue::{JobScheduler, ScheduleError};
use crate::store::{RevocationStore, SessionStore, StoreError};

/// Build a session row for seeding a fake store. The id is assigned by
/// [`InMemorySessionStore::seed`].
pub(crate) fn session_row(
    user_id: DbId,
    session_token: &str,
    fingerprint: &DeviceFingerprint,
    last_active_at: Timestamp,
) -> DeviceSession {
    DeviceSession {
        id: 0,
        user_id,
        session_token: session_token.to_string(),
        browser_name: fingerprint.browser_name.clone(),
        browser_version: fingerprint.browser_version.clone(),
        os_name: fingerprint.os_name.clone(),
        os_version: fingerprint.os_version.clone(),
        device_type: fingerprint.device_type.clone(),
        device_vendor: fingerprint.device_vendor.clone(),
        device_model: fingerprint.device_model.clone(),
        ip_address_enc: None,
        location: None,
        is_current_session: false,
        last_active_at,
        created_at: last_active_at,
    }
}

/// Vec-backed [`SessionStore`].
pub(crate) struct InMemorySessionStore {
    rows: Mutex<Vec<DeviceSession>>,
    next_id: AtomicI64,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn seed(&self, mut row: DeviceSession) -> DbId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        row.id = id;
        self.rows.lock().unwrap().push(row);
        id
    }

    pub fn set_current(&self, session_token: &str) {
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut() {
            row.is_current_session = row.session_token == session_token;
        }
    }

    pub fn contains_token(&self, session_token: &str) -> bool {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.session_token == session_token)
    }

    pub fn row(&self, id: DbId) -> DeviceSession {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .expect("row should exist")
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_by_token(
        &self,
        session_token: &str,
    ) -> Result<Option<DeviceSession>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.session_token == session_token)
            .cloned())
    }

    async fn find_device_match(
        &self,
        user_id: DbId,
        fingerprint: &DeviceFingerprint,
    ) -> Result<Option<DeviceSession>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && &r.fingerprint() == fingerprint)
            .max_by_key(|r| r.last_active_at)
            .cloned())
    }

    async fn touch(
        &self,
        id: DbId,
        ip_address_enc: Option<&str>,
        location: Option<&str>,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.last_active_at = row.last_active_at.max(now);
            row.ip_address_enc = ip_address_enc.map(Into::into);
            row.location = location.map(Into::into);
        }
        Ok(())
    }

    async fn rotate_token(
        &self,
        id: DbId,
        new_token: &str,
        ip_address_enc: Option<&str>,
        location: Option<&str>,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.session_token = new_token.to_string();
            row.last_active_at = row.last_active_at.max(now);
            row.ip_address_enc = ip_address_enc.map(Into::into);
            row.location = location.map(Into::into);
        }
        Ok(())
    }

    async fn insert(&self, session: NewDeviceSession) -> Result<DeviceSession, StoreError> {
        let mut row = session_row(
            session.user_id,
            &session.session_token,
            &session.fingerprint,
            session.last_active_at,
        );
        row.ip_address_enc = session.ip_address_enc;
        row.location = session.location;
        let id = self.seed(row);
        Ok(self.row(id))
    }

    async fn list_all(&self) -> Result<Vec<DeviceSession>, StoreError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn reap(
        &self,
        session_token: &str,
        inactive_since: Timestamp,
    ) -> Result<ReapOutcome, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(pos) = rows.iter().position(|r| r.session_token == session_token) else {
            return Ok(ReapOutcome::NoAction);
        };
        let outcome = lifecycle::evaluate_reap(
            rows[pos].last_active_at,
            rows[pos].is_current_session,
            inactive_since,
        );
        if outcome == ReapOutcome::Deleted {
            rows.remove(pos);
        }
        Ok(outcome)
    }
}

/// Scheduler fake that records every enqueue, or fails on demand.
pub(crate) struct RecordingScheduler {
    calls: Mutex<Vec<(SessionJob, Option<Timestamp>)>>,
    fail: bool,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(SessionJob, Option<Timestamp>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobScheduler for RecordingScheduler {
    async fn enqueue(
        &self,
        job: &SessionJob,
        not_before: Option<Timestamp>,
    ) -> Result<(), ScheduleError> {
        if self.fail {
            return Err(ScheduleError::Unavailable("scheduler offline".into()));
        }
        self.calls.lock().unwrap().push((job.clone(), not_before));
        Ok(())
    }
}

/// Vec-backed [`RevocationStore`].
pub(crate) struct InMemoryRevocationStore {
    rows: Mutex<Vec<(String, Timestamp)>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn seed(&self, session_token: &str, expires_at: Timestamp) {
        self.rows
            .lock()
            .unwrap()
            .push((session_token.to_string(), expires_at));
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn active_tokens(&self, now: Timestamp) -> Result<Vec<String>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(token, _)| token.clone())
            .collect())
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(_, expires_at)| *expires_at > now);
        Ok((before - rows.len()) as u64)
    }
}

/// Cache fake whose writes always fail.
pub(crate) struct FailingCache;

#[async_trait]
impl RevocationCache for FailingCache {
    async fn replace_all(&self, _tokens: Vec<String>) -> Result<(), CacheError> {
        Err(CacheError::WriteFailed("cache offline".into()))
    }

    async fn contains(&self, _session_token: &str) -> Result<bool, CacheError> {
        Err(CacheError::WriteFailed("cache offline".into()))
    }
}
