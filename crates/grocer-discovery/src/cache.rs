//! In-memory TTL cache for discovery responses.
//!
//! Entries expire lazily: a stale entry is dropped the next time its key is
//! read, or when any other key is written. Nothing is persisted across
//! restarts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of the current time, injectable so expiry can be tested without
/// sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Normalized cache key. Parameters are lowercased, trimmed, and have inner
/// whitespace collapsed, so `" Chicago,  IL"` and `"chicago, il"` share an
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn stores(location: &str) -> Self {
        Self(format!("stores:{}", normalize_part(location)))
    }

    #[must_use]
    pub fn products(query: &str, store_name: &str, location: &str) -> Self {
        Self(format!(
            "products:{}|{}|{}",
            normalize_part(query),
            normalize_part(store_name),
            normalize_part(location)
        ))
    }

    #[must_use]
    pub fn store_details(store_name: &str, location: &str) -> Self {
        Self(format!(
            "details:{}|{}",
            normalize_part(store_name),
            normalize_part(location)
        ))
    }

    /// Store order does not change the key.
    #[must_use]
    pub fn aggregate(query: &str, location: &str, stores: &[String]) -> Self {
        let mut stores: Vec<String> = stores.iter().map(|s| normalize_part(s)).collect();
        stores.sort();
        Self(format!(
            "aggregate:{}|{}|{}",
            normalize_part(query),
            normalize_part(location),
            stores.join(",")
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_part(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Thread-safe TTL cache. Concurrent writes to the same key resolve
/// last-write-wins.
pub struct DiscoveryCache<V> {
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
}

impl<V: Clone> DiscoveryCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave a half-written entry,
        // so the map is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value if it has not yet expired. An expired entry
    /// is removed.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::debug!(key = %key, "evicted expired cache entry");
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, replacing any existing entry. Expired
    /// entries for other keys are purged at the same time, so keys that are
    /// never read again do not accumulate.
    pub fn put(&self, key: CacheKey, value: V) {
        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| created_at < entry.expires_at);
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, "purged expired cache entries");
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at,
                expires_at,
            },
        );
    }

    /// Number of entries held, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
