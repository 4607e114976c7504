//! Revoked token model.

use casetrace_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `revoked_tokens` table — one explicitly invalidated
/// session credential, kept until the token's natural expiry.
#[derive(Debug, Clone, FromRow)]
pub struct RevokedToken {
    pub id: DbId,
    pub session_token: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}
