//! Low-latency revocation cache.
//!
//! Request-time validation consults this membership set to reject revoked
//! credentials without a durable-store round trip. The cache is a derived,
//! disposable projection: it can be fully rebuilt from the `revoked_tokens`
//! table at any time by the sync job.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Errors from the revocation cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Revocation cache write failed: {0}")]
    WriteFailed(String),
}

/// Shared membership set of revoked session tokens.
#[async_trait]
pub trait RevocationCache: Send + Sync {
    /// Replace the entire membership set with `tokens`.
    async fn replace_all(&self, tokens: Vec<String>) -> Result<(), CacheError>;

    /// Membership test used by request-time validation.
    async fn contains(&self, session_token: &str) -> Result<bool, CacheError>;
}

/// In-process cache backed by an `RwLock<HashSet>`, shared via `Arc`.
#[derive(Default)]
pub struct InMemoryRevocationCache {
    tokens: RwLock<HashSet<String>>,
}

impl InMemoryRevocationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationCache for InMemoryRevocationCache {
    async fn replace_all(&self, tokens: Vec<String>) -> Result<(), CacheError> {
        let mut guard = self.tokens.write().await;
        *guard = tokens.into_iter().collect();
        Ok(())
    }

    async fn contains(&self, session_token: &str) -> Result<bool, CacheError> {
        Ok(self.tokens.read().await.contains(session_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_all_overwrites_previous_membership() {
        let cache = InMemoryRevocationCache::new();
        cache.replace_all(vec!["a".into(), "b".into()]).await.unwrap();
        cache.replace_all(vec!["c".into()]).await.unwrap();

        assert!(!cache.contains("a").await.unwrap());
        assert!(!cache.contains("b").await.unwrap());
        assert!(cache.contains("c").await.unwrap());
    }

    #[tokio::test]
    async fn empty_replace_clears_the_set() {
        let cache = InMemoryRevocationCache::new();
        cache.replace_all(vec!["a".into()]).await.unwrap();
        cache.replace_all(Vec::new()).await.unwrap();
        assert!(!cache.contains("a").await.unwrap());
    }
}
