//! Time-boxed in-memory cache keyed by symbol.
//!
//! A `TtlCache` pairs every value with the `Instant` it was stored. Reads through
//! [`TtlCache::get`] only return entries younger than the TTL; [`TtlCache::get_stale`]
//! returns whatever is stored, which the fallback chain uses as a degraded answer
//! when every upstream fails.
//!
//! Design notes:
//! - Time comes from a [`Clock`], so tests can advance it with [`ManualClock`]
//!   instead of sleeping.
//! - There is no capacity bound and no eviction; an entry lives until it is
//!   overwritten.
//! - The cache is not synchronized; shared instances are wrapped in a `Mutex`.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::sync::lock;

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        *lock(&self.offset) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *lock(&self.offset)
    }
}

/// Whether a cached value is still within its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Younger than the TTL.
    Fresh,
    /// Present but expired.
    Stale,
}

struct CacheEntry<V> {
    value: V,
    last_updated: Instant,
}

/// Symbol-keyed cache with a fixed time-to-live.
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        TtlCache {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    /// Value for `key` if it is still fresh.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.lookup(key) {
            Some((value, Freshness::Fresh)) => Some(value),
            _ => None,
        }
    }

    /// Value for `key` regardless of age.
    pub fn get_stale(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Value for `key` together with its freshness.
    pub fn lookup(&self, key: &str) -> Option<(V, Freshness)> {
        let now = self.clock.now();
        self.entries.get(key).map(|entry| {
            let freshness = if now.saturating_duration_since(entry.last_updated) < self.ttl {
                Freshness::Fresh
            } else {
                Freshness::Stale
            };
            (entry.value.clone(), freshness)
        })
    }

    /// Store `value` under `key` with a fresh timestamp.
    pub fn put(&mut self, key: &str, value: V) {
        let last_updated = self.clock.now();
        self.entries
            .insert(key.to_string(), CacheEntry { value, last_updated });
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
