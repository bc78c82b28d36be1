use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::RefreshTokenCache;

use crate::domain::authentication::errors::AuthError;
use crate::domain::authentication::ports::RefreshTokenStore;

/// Process-local refresh token pairing store.
///
/// Suitable for a single instance only; replicas need a shared store with
/// atomic redeem.
#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenStore {
    cache: Arc<RefreshTokenCache>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired pairing, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn put(
        &self,
        access_token: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        self.cache.put(access_token, refresh_token, ttl);
        Ok(())
    }

    async fn get(&self, access_token: &str) -> Result<Option<String>, AuthError> {
        Ok(self.cache.get(access_token))
    }

    async fn remove(&self, access_token: &str) -> Result<(), AuthError> {
        self.cache.remove(access_token);
        Ok(())
    }

    async fn redeem(&self, access_token: &str, refresh_token: &str) -> Result<bool, AuthError> {
        Ok(self.cache.redeem(access_token, refresh_token))
    }
}
