//! In-process cache tier.
//!
//! A bounded map guarded by a single mutex, with per-entry deadlines and
//! two eviction policies. Expired entries are purged lazily on access;
//! there is no cleaner task. Capacity is exact: the map never holds more
//! than `maxsize` live entries.
//!
//! Expired-but-unevicted entries are treated as absent by every
//! operation, including the conditional set. Lazy purges are counted in
//! the eviction counter so the stats stay consistent with that choice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CacheBackend, MemoryStats, TierStats};
use crate::error::{CacheError, Result};
use crate::serializer::CacheValue;

/// How the memory tier picks a victim once it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Evict the entry with the nearest deadline. Entries without a
    /// deadline go last, oldest insertion first.
    Ttl,
    /// Evict the least-recently-accessed entry. Expired entries are
    /// always purged before a recency victim is chosen.
    Lru,
}

impl std::fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ttl => write!(f, "ttl"),
            Self::Lru => write!(f, "lru"),
        }
    }
}

impl std::str::FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ttl" => Ok(Self::Ttl),
            "lru" => Ok(Self::Lru),
            other => Err(CacheError::configuration(format!(
                "unknown l1_backend '{other}', expected 'ttl' or 'lru'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: CacheValue,
    expires_at: Option<Instant>,
    inserted_at: Instant,
    last_access: Instant,
}

impl MemoryEntry {
    fn new(value: CacheValue, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: ttl.map(|t| now + t),
            inserted_at: now,
            last_access: now,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= Instant::now())
    }
}

/// Bounded in-memory cache tier.
#[derive(Debug)]
pub struct MemoryBackend {
    policy: EvictionPolicy,
    maxsize: usize,
    default_ttl: Duration,
    entries: Mutex<HashMap<String, MemoryEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryBackend {
    /// Create a new memory tier.
    ///
    /// `default_ttl` is reported in stats; effective TTLs are resolved
    /// per call by the coordinator.
    pub fn new(maxsize: usize, default_ttl: Duration, policy: EvictionPolicy) -> Self {
        Self {
            policy,
            maxsize,
            default_ttl,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Remove `key` if its entry is present but expired. Returns whether
    /// an expired entry was dropped.
    fn drop_if_expired(&self, entries: &mut HashMap<String, MemoryEntry>, key: &str) -> bool {
        let expired = entries.get(key).is_some_and(MemoryEntry::is_expired);
        if expired {
            entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        expired
    }

    /// Drop every expired entry. Returns the number removed.
    fn purge_expired(&self, entries: &mut HashMap<String, MemoryEntry>) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    /// Remove one victim according to the eviction policy.
    fn evict_one(&self, entries: &mut HashMap<String, MemoryEntry>) {
        let victim = match self.policy {
            EvictionPolicy::Ttl => entries
                .iter()
                .min_by(|(_, a), (_, b)| match (a.expires_at, b.expires_at) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => a.inserted_at.cmp(&b.inserted_at),
                })
                .map(|(key, _)| key.clone()),
            EvictionPolicy::Lru => entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone()),
        };

        if let Some(key) = victim {
            entries.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, policy = %self.policy, "evicted L1 entry");
        }
    }

    /// Make room for one more entry if the map is at capacity.
    fn make_room(&self, entries: &mut HashMap<String, MemoryEntry>) {
        if entries.len() >= self.maxsize {
            self.purge_expired(entries);
        }
        while entries.len() >= self.maxsize {
            self.evict_one(entries);
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut entries = self.entries.lock();
        if self.drop_if_expired(&mut entries, key) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "L1 entry expired");
            return Ok(None);
        }
        match entries.get_mut(key) {
            Some(entry) => {
                entry.last_access = Instant::now();
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.value.clone()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            self.make_room(&mut entries);
        }
        entries.insert(key.to_string(), MemoryEntry::new(value, ttl));
        Ok(())
    }

    async fn set_if_not_exist(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let mut entries = self.entries.lock();
        self.drop_if_expired(&mut entries, key);
        if entries.contains_key(key) {
            return Ok(false);
        }
        self.make_room(&mut entries);
        entries.insert(key.to_string(), MemoryEntry::new(value, ttl));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock();
        match entries.remove(key) {
            Some(entry) if entry.is_expired() => {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn clear(&self) -> Result<u64> {
        let mut entries = self.entries.lock();
        let removed = entries.len() as u64;
        entries.clear();
        debug!(removed, "L1 cache cleared");
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock();
        self.drop_if_expired(&mut entries, key);
        Ok(entries.contains_key(key))
    }

    async fn get_ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut entries = self.entries.lock();
        self.drop_if_expired(&mut entries, key);
        Ok(entries.get(key).and_then(|entry| {
            entry
                .expires_at
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
        }))
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries);
        let keys = entries
            .keys()
            .filter(|key| prefix.is_none_or(|p| key.starts_with(p)))
            .cloned()
            .collect();
        Ok(keys)
    }

    async fn get_size(&self) -> Result<u64> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries);
        Ok(entries.len() as u64)
    }

    async fn get_stats(&self) -> TierStats {
        let size = {
            let mut entries = self.entries.lock();
            self.purge_expired(&mut entries);
            entries.len() as u64
        };
        TierStats::Memory(MemoryStats {
            backend: "memory",
            enabled: true,
            policy: self.policy,
            size,
            maxsize: self.maxsize as u64,
            default_ttl_secs: self.default_ttl.as_secs(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }
}
