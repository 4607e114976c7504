//! Final deletion stage.
//!
//! All safety checks happen inside the store's row-locked reap so that a
//! login racing with the delete cannot lose the session. The handler itself
//! only reports what the store decided.

use std::sync::Arc;

use casetrace_core::lifecycle::ReapOutcome;

use crate::error::SessionError;
use crate::jobs::DeleteSession;
use crate::store::SessionStore;

/// Handler for `session.delete` jobs.
pub struct SessionReaper {
    store: Arc<dyn SessionStore>,
}

impl SessionReaper {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, job: &DeleteSession) -> Result<ReapOutcome, SessionError> {
        let outcome = self
            .store
            .reap(&job.session_token, job.inactive_since)
            .await?;

        tracing::info!(
            user_id = job.user_id,
            action = outcome.as_str(),
            "Session reap evaluated"
        );
        Ok(outcome)
    }
}
