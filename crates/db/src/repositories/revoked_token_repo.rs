//! Repository for the `revoked_tokens` table.

use casetrace_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::revoked_token::RevokedToken;

const COLUMNS: &str = "id, session_token, expires_at, created_at";

/// Provides access to explicitly invalidated session credentials.
pub struct RevokedTokenRepo;

impl RevokedTokenRepo {
    /// Record a revoked token until its natural expiry.
    ///
    /// Re-revoking the same token refreshes `expires_at` instead of
    /// violating the unique constraint.
    pub async fn insert(
        pool: &PgPool,
        session_token: &str,
        expires_at: Timestamp,
    ) -> Result<RevokedToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO revoked_tokens (session_token, expires_at) \
             VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_revoked_tokens_token \
             DO UPDATE SET expires_at = EXCLUDED.expires_at \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RevokedToken>(&query)
            .bind(session_token)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// All tokens whose revocation is still in force at `now`.
    pub async fn list_active(pool: &PgPool, now: Timestamp) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT session_token FROM revoked_tokens WHERE expires_at > $1",
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// Delete revocation rows past their expiry. Returns the purge count.
    pub async fn purge_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
