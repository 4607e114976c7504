//! Repository for the `device_sessions` table.

use casetrace_core::lifecycle::{self, ReapOutcome};
use casetrace_core::types::{DbId, Timestamp};
use casetrace_core::user_agent::DeviceFingerprint;
use sqlx::PgPool;

use crate::models::device_session::{DeviceSession, NewDeviceSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, session_token, browser_name, browser_version, \
                        os_name, os_version, device_type, device_vendor, device_model, \
                        ip_address_enc, location, is_current_session, \
                        last_active_at, created_at";

/// Provides CRUD operations for device sessions.
pub struct DeviceSessionRepo;

impl DeviceSessionRepo {
    /// Insert a new session row, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &NewDeviceSession,
    ) -> Result<DeviceSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_sessions \
                 (user_id, session_token, browser_name, browser_version, \
                  os_name, os_version, device_type, device_vendor, device_model, \
                  ip_address_enc, location, last_active_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceSession>(&query)
            .bind(input.user_id)
            .bind(&input.session_token)
            .bind(&input.fingerprint.browser_name)
            .bind(&input.fingerprint.browser_version)
            .bind(&input.fingerprint.os_name)
            .bind(&input.fingerprint.os_version)
            .bind(&input.fingerprint.device_type)
            .bind(&input.fingerprint.device_vendor)
            .bind(&input.fingerprint.device_model)
            .bind(&input.ip_address_enc)
            .bind(&input.location)
            .bind(input.last_active_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by its exact token.
    pub async fn find_by_token(
        pool: &PgPool,
        session_token: &str,
    ) -> Result<Option<DeviceSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM device_sessions WHERE session_token = $1");
        sqlx::query_as::<_, DeviceSession>(&query)
            .bind(session_token)
            .fetch_optional(pool)
            .await
    }

    /// Find a session for `user_id` whose device fingerprint matches.
    ///
    /// `IS NOT DISTINCT FROM` makes null attributes compare equal, so an
    /// unparseable user agent still matches deterministically. The most
    /// recently active match wins when a user somehow has duplicates.
    pub async fn find_device_match(
        pool: &PgPool,
        user_id: DbId,
        fingerprint: &DeviceFingerprint,
    ) -> Result<Option<DeviceSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM device_sessions \
             WHERE user_id = $1 \
               AND browser_name IS NOT DISTINCT FROM $2 \
               AND browser_version IS NOT DISTINCT FROM $3 \
               AND os_name IS NOT DISTINCT FROM $4 \
               AND os_version IS NOT DISTINCT FROM $5 \
               AND device_type IS NOT DISTINCT FROM $6 \
               AND device_vendor IS NOT DISTINCT FROM $7 \
               AND device_model IS NOT DISTINCT FROM $8 \
             ORDER BY last_active_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, DeviceSession>(&query)
            .bind(user_id)
            .bind(&fingerprint.browser_name)
            .bind(&fingerprint.browser_version)
            .bind(&fingerprint.os_name)
            .bind(&fingerprint.os_version)
            .bind(&fingerprint.device_type)
            .bind(&fingerprint.device_vendor)
            .bind(&fingerprint.device_model)
            .fetch_optional(pool)
            .await
    }

    /// Advance `last_active_at` and refresh the encrypted IP in place.
    ///
    /// `GREATEST` keeps `last_active_at` monotonic under concurrent
    /// trackers.
    pub async fn touch(
        pool: &PgPool,
        id: DbId,
        ip_address_enc: Option<&str>,
        location: Option<&str>,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE device_sessions \
             SET last_active_at = GREATEST(last_active_at, $2), \
                 ip_address_enc = $3, location = $4 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .bind(ip_address_enc)
        .bind(location)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Replace the row's credential after a token rotation, advancing
    /// `last_active_at`.
    pub async fn rotate_token(
        pool: &PgPool,
        id: DbId,
        new_token: &str,
        ip_address_enc: Option<&str>,
        location: Option<&str>,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE device_sessions \
             SET session_token = $2, \
                 last_active_at = GREATEST(last_active_at, $3), \
                 ip_address_enc = $4, location = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(new_token)
        .bind(now)
        .bind(ip_address_enc)
        .bind(location)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List every session row (used by the backfill job).
    pub async fn list_all(pool: &PgPool) -> Result<Vec<DeviceSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM device_sessions ORDER BY id");
        sqlx::query_as::<_, DeviceSession>(&query)
            .fetch_all(pool)
            .await
    }

    /// Re-verify and delete a stale session inside one transaction.
    ///
    /// The row is locked with `FOR UPDATE` so a concurrent tracker cannot
    /// reactivate it between the check and the delete. Deletion is only
    /// performed when the record has seen no activity after
    /// `inactive_since` and is not the current session.
    pub async fn reap(
        pool: &PgPool,
        session_token: &str,
        inactive_since: Timestamp,
    ) -> Result<ReapOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query =
            format!("SELECT {COLUMNS} FROM device_sessions WHERE session_token = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, DeviceSession>(&query)
            .bind(session_token)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(session) = row else {
            tx.commit().await?;
            return Ok(ReapOutcome::NoAction);
        };

        let outcome = lifecycle::evaluate_reap(
            session.last_active_at,
            session.is_current_session,
            inactive_since,
        );

        if outcome == ReapOutcome::Deleted {
            sqlx::query("DELETE FROM device_sessions WHERE id = $1")
                .bind(session.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(outcome)
    }
}
