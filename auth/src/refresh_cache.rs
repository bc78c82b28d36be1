use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use parking_lot::Mutex;

/// Process-local map from an issued access token to its paired refresh token.
///
/// Entries expire after their TTL: lookups evict lazily and
/// [`RefreshTokenCache::purge_expired`] sweeps the whole map. All operations
/// take the same lock, so [`RefreshTokenCache::redeem`] is an atomic
/// check-then-delete with respect to every other caller.
#[derive(Default)]
pub struct RefreshTokenCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    refresh_token: String,
    /// `None` when the TTL runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

impl RefreshTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a pairing, replacing any previous entry for the same access token.
    pub fn put(&self, access_token: impl Into<String>, refresh_token: impl Into<String>, ttl: Duration) {
        let entry = CacheEntry {
            refresh_token: refresh_token.into(),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.lock().insert(access_token.into(), entry);
    }

    /// Refresh token paired with `access_token`, if present and not expired.
    pub fn get(&self, access_token: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(access_token) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.remove(access_token);
                None
            }
            Some(entry) => Some(entry.refresh_token.clone()),
            None => None,
        }
    }

    /// Drop the pairing for `access_token`, returning the refresh token if it was live.
    pub fn remove(&self, access_token: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .lock()
            .remove(access_token)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.refresh_token)
    }

    /// Consume the pairing if, and only if, it is live and matches `refresh_token` exactly.
    ///
    /// Returns `true` for exactly one caller per stored entry. A mismatch
    /// leaves the entry in place.
    pub fn redeem(&self, access_token: &str, refresh_token: &str) -> bool {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        match entries.get(access_token) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(access_token);
                false
            }
            Some(entry) if entry.refresh_token == refresh_token => {
                entries.remove(access_token);
                true
            }
            _ => false,
        }
    }

    /// Evict every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_put_and_get() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "refresh", HOUR);

        assert_eq!(cache.get("access"), Some("refresh".to_string()));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn test_put_overwrites() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "first", HOUR);
        cache.put("access", "second", HOUR);

        assert_eq!(cache.get("access"), Some("second".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "refresh", HOUR);

        assert_eq!(cache.remove("access"), Some("refresh".to_string()));
        assert_eq!(cache.get("access"), None);
        assert_eq!(cache.remove("access"), None);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_get() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "refresh", Duration::ZERO);

        assert_eq!(cache.get("access"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "refresh", Duration::from_millis(20));
        assert!(cache.get("access").is_some());

        thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("access"), None);
    }

    #[test]
    fn test_redeem_is_single_use() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "refresh", HOUR);

        assert!(cache.redeem("access", "refresh"));
        assert!(!cache.redeem("access", "refresh"));
    }

    #[test]
    fn test_redeem_mismatch_keeps_entry() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "refresh", HOUR);

        assert!(!cache.redeem("access", "someone-elses-refresh"));
        assert_eq!(cache.get("access"), Some("refresh".to_string()));
    }

    #[test]
    fn test_redeem_expired_entry_fails() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "refresh", Duration::ZERO);

        assert!(!cache.redeem("access", "refresh"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let cache = RefreshTokenCache::new();
        cache.put("access", "refresh", Duration::MAX);

        assert_eq!(cache.purge_expired(), 0);
        assert!(cache.redeem("access", "refresh"));
    }

    #[test]
    fn test_purge_expired() {
        let cache = RefreshTokenCache::new();
        cache.put("stale-1", "r1", Duration::ZERO);
        cache.put("stale-2", "r2", Duration::ZERO);
        cache.put("live", "r3", HOUR);

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("live"), Some("r3".to_string()));
    }

    #[test]
    fn test_concurrent_redeem_succeeds_once() {
        let cache = Arc::new(RefreshTokenCache::new());
        cache.put("access", "refresh", HOUR);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.redeem("access", "refresh"))
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|redeemed| *redeemed)
            .count();

        assert_eq!(successes, 1);
    }
}
