//! DetectionCache: string, key-index and result caches for one detector.
//!
//! Keys are xxh3 hashes of a bounded prefix of the serialized input. Every
//! entry also stores the full serialized input and a hit is only trusted
//! when it compares equal, so a prefix collision degrades to a miss.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use exportsniff_core::config::CacheConfig;
use lru::LruCache;
use serde::Serialize;
use serde_json::Value;

use crate::evidence::{KeyIndex, Sample};
use crate::formats::SupportedFormat;

use super::hasher::prefix_key;

#[derive(Debug)]
struct Entry<T> {
    serialized: Arc<str>,
    value: T,
}

#[derive(Debug)]
struct CacheState {
    lowered: LruCache<u64, Entry<Arc<str>>>,
    keys: LruCache<u64, Entry<Arc<KeyIndex>>>,
    results: LruCache<u64, Entry<SupportedFormat>>,
}

/// Insert or refresh `key`. Returns 1 when the least recently used entry
/// was pushed out to make room.
fn push_counting<V>(cache: &mut LruCache<u64, V>, key: u64, value: V) -> usize {
    match cache.push(key, value) {
        Some((old, _)) if old != key => 1,
        _ => 0,
    }
}

/// Hit/miss counters and current sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub collisions: u64,
    pub evictions: u64,
    pub string_entries: usize,
    pub key_entries: usize,
    pub result_entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
pub struct DetectionCache {
    state: Mutex<CacheState>,
    key_prefix_bytes: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    collisions: AtomicU64,
    evictions: AtomicU64,
}

impl DetectionCache {
    /// A capacity of zero is treated as one.
    pub fn new(max_entries: usize, key_prefix_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                lowered: LruCache::new(capacity),
                keys: LruCache::new(capacity),
                results: LruCache::new(capacity),
            }),
            key_prefix_bytes: key_prefix_bytes.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            collisions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.effective_max_cache_size(), config.effective_key_prefix_bytes())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(&self, serialized: &str) -> u64 {
        prefix_key(serialized, self.key_prefix_bytes)
    }

    /// Cached detection result for exactly this input.
    pub fn get_result(&self, serialized: &str) -> Option<SupportedFormat> {
        let key = self.key(serialized);
        let found = {
            let mut state = self.lock();
            match state.results.get(&key) {
                Some(entry) if &*entry.serialized == serialized => Ok(entry.value),
                Some(_) => Err(true),
                None => Err(false),
            }
        };
        match found {
            Ok(format) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(format)
            }
            Err(collision) => {
                if collision {
                    self.collisions.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key, "prefix-hash collision rejected");
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put_result(&self, serialized: Arc<str>, format: SupportedFormat) {
        let key = self.key(&serialized);
        let evicted = push_counting(
            &mut self.lock().results,
            key,
            Entry {
                serialized,
                value: format,
            },
        );
        self.record_evictions(evicted);
    }

    /// Sample views for `value`, reusing cached lower-cased text and key
    /// index when they belong to exactly this input.
    pub fn sample_for(&self, value: &Value, serialized: Arc<str>) -> Sample {
        let key = self.key(&serialized);
        let (lowered, keys) = {
            let mut state = self.lock();
            let lowered = state
                .lowered
                .get(&key)
                .filter(|e| e.serialized == serialized)
                .map(|e| Arc::clone(&e.value));
            let keys = state
                .keys
                .get(&key)
                .filter(|e| e.serialized == serialized)
                .map(|e| Arc::clone(&e.value));
            (lowered, keys)
        };

        let mut evicted = 0;
        let lowered = match lowered {
            Some(l) => l,
            None => {
                let l: Arc<str> = serialized.to_lowercase().into();
                evicted += push_counting(
                    &mut self.lock().lowered,
                    key,
                    Entry {
                        serialized: Arc::clone(&serialized),
                        value: Arc::clone(&l),
                    },
                );
                l
            }
        };
        let keys = match keys {
            Some(k) => k,
            None => {
                let k = Arc::new(KeyIndex::build(value));
                evicted += push_counting(
                    &mut self.lock().keys,
                    key,
                    Entry {
                        serialized: Arc::clone(&serialized),
                        value: Arc::clone(&k),
                    },
                );
                k
            }
        };
        self.record_evictions(evicted);
        Sample::from_parts(serialized, lowered, keys)
    }

    fn record_evictions(&self, evicted: usize) {
        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            string_entries: state.lowered.len(),
            key_entries: state.keys.len(),
            result_entries: state.results.len(),
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.lowered.clear();
        state.keys.clear();
        state.results.clear();
    }
}

/// Sleep until at least `floor` has elapsed since `start`.
pub fn enforce_min_detection_time(start: Instant, floor: Duration) {
    let elapsed = start.elapsed();
    if elapsed < floor {
        std::thread::sleep(floor - elapsed);
    }
}
