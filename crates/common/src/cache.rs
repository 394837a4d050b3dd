//! TTL snapshot cache with injected clock
//!
//! A small keyed cache where every entry carries its insertion time and
//! validity is `now - inserted_at < ttl`. Unlike an evicting cache, expired
//! entries are retained until overwritten or explicitly removed so callers
//! can deliberately serve stale data when a refresh fails.
//!
//! The cache is an explicit object handed to its owner, never a module-level
//! global, and takes a [`Clock`] so tests can control time.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::time::{Clock, SystemClock};

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<V> {
    /// Entry present and within its TTL.
    Fresh(V),
    /// Entry present but its TTL has elapsed.
    Stale(V),
    /// No entry for the key.
    Miss,
}

impl<V> CacheLookup<V> {
    /// The value if fresh, otherwise `None`.
    pub fn fresh(self) -> Option<V> {
        match self {
            Self::Fresh(value) => Some(value),
            _ => None,
        }
    }

    /// The value regardless of freshness, otherwise `None`.
    pub fn any(self) -> Option<V> {
        match self {
            Self::Fresh(value) | Self::Stale(value) => Some(value),
            Self::Miss => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded key→value cache with per-entry TTL and stale reads.
pub struct TtlCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
    max_entries: usize,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the system clock.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Create a cache with a custom clock (useful for testing).
    pub fn with_clock(ttl: Duration, max_entries: usize, clock: C) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl, max_entries: max_entries.max(1), clock }
    }

    /// Insert or replace the value for `key`, resetting its TTL.
    ///
    /// When the cache is full the entry with the oldest insertion time is
    /// dropped to make room.
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        let Ok(mut entries) = self.entries.lock() else { return };

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let oldest =
                entries.iter().min_by_key(|(_, e)| e.inserted_at).map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(key, Entry { value, inserted_at: now });
    }

    /// Look up `key`, reporting whether the entry is still within its TTL.
    pub fn lookup(&self, key: &K) -> CacheLookup<V> {
        let now = self.clock.now();
        let Ok(entries) = self.entries.lock() else { return CacheLookup::Miss };

        match entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => {
                CacheLookup::Fresh(entry.value.clone())
            }
            Some(entry) => CacheLookup::Stale(entry.value.clone()),
            None => CacheLookup::Miss,
        }
    }

    /// Remove the entry for `key`, if any.
    pub fn remove(&self, key: &K) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    /// Drop all entries.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
