//! Pipeline-level error type.
//!
//! Each stage owns its own error boundary: errors returned here are retried
//! by the job runner, never propagated backward to an earlier stage.

use casetrace_core::error::CoreError;

use crate::cache::CacheError;
use crate::queue::ScheduleError;
use crate::store::StoreError;

/// Errors raised by the session lifecycle handlers.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The durable store was unreachable or rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The revocation cache write failed. Security relevant: a revoked
    /// credential might still validate until the next successful sync.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A downstream job could not be enqueued.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// IP encryption failed or the key is misconfigured.
    #[error(transparent)]
    Crypto(#[from] CoreError),
}
