//! Read-through cache for unfiltered event listings.
//!
//! Explicit invalidation is the consistency mechanism; the TTL only bounds how
//! long an entry can live if nobody mutates the catalog. Every fill carries
//! the generation observed before the underlying read, and a fill from an
//! older generation is dropped, so a listing computed before an invalidation
//! can never be stored after it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use boxoffice_core::Clock;

/// Listing window identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub page: u32,
    pub per_page: u32,
}

/// Opaque token taken before reading the source of a fill.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FillToken(u64);

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
struct CacheState<V> {
    generation: u64,
    entries: HashMap<CacheKey, Entry<V>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

pub struct EventCache<V> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: Mutex<CacheState<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl<V: Clone> EventCache<V> {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            state: Mutex::new(CacheState {
                generation: 0,
                entries: HashMap::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current generation. Take it before reading the data you intend to `put`.
    pub fn fill_token(&self) -> FillToken {
        match self.state.lock() {
            Ok(state) => FillToken(state.generation),
            // Never matches, so a poisoned cache degrades to a pass-through.
            Err(_) => FillToken(u64::MAX),
        }
    }

    pub fn get(&self, key: CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return None,
        };

        let hit = match state.entries.get(&key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                state.entries.remove(&key);
                None
            }
            None => None,
        };

        match hit {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Store `value` with the configured TTL. Returns `false` when the fill is
    /// stale (an invalidation happened after `token` was taken).
    pub fn put(&self, key: CacheKey, value: V, token: FillToken) -> bool {
        self.put_with_ttl(key, value, self.ttl, token)
    }

    pub fn put_with_ttl(&self, key: CacheKey, value: V, ttl: Duration, token: FillToken) -> bool {
        // Saturate: an oversized TTL means the entry never expires on its own.
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return false,
        };

        if state.generation != token.0 {
            tracing::debug!(page = key.page, per_page = key.per_page, "discarding stale listing fill");
            return false;
        }

        state.entries.insert(key, Entry { value, expires_at });
        true
    }

    /// Drop every entry and bump the generation. Returns the number evicted.
    pub fn invalidate_all(&self) -> usize {
        // Invalidation must win even over a poisoned lock.
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.generation = state.generation.wrapping_add(1);
        let evicted = state.entries.len();
        state.entries.clear();
        drop(state);

        self.invalidations.fetch_add(1, Ordering::Relaxed);
        tracing::info!(evicted, "event listing cache cleared");
        evicted
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}
