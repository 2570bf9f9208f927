//! Cache tier backends.
//!
//! Both tiers implement the same [`CacheBackend`] contract so the
//! coordinator can sequence them uniformly:
//!
//! - [`MemoryBackend`]: bounded in-process map with per-entry TTL and a
//!   configurable eviction policy.
//! - [`RedisBackend`]: Redis/Valkey client with key namespacing and a
//!   pluggable value serializer.

mod memory;
mod redis;

pub use self::memory::{EvictionPolicy, MemoryBackend};
pub use self::redis::RedisBackend;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::serializer::CacheValue;

/// Common contract implemented by every cache tier.
///
/// Absence is a normal return (`None` / `false`), never an error. Errors
/// from the memory tier only ever reflect caller misuse; errors from the
/// remote tier are classified as connection or serialization failures.
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Store `value` under `key`, overwriting any previous entry.
    ///
    /// A `None` TTL means "no expiry" for the memory tier and "use the
    /// configured default" for the remote tier.
    async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> Result<()>;

    /// Store `value` only if `key` is currently absent.
    ///
    /// Returns whether the value was stored.
    async fn set_if_not_exist(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<bool>;

    /// Remove `key`. Returns whether an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every entry owned by this backend.
    ///
    /// Returns the number of entries removed. The remote tier only
    /// touches keys under its configured prefix.
    async fn clear(&self) -> Result<u64>;

    /// Whether `key` is currently present.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remaining time to live for `key`.
    ///
    /// `None` when the key is absent or has no expiry.
    async fn get_ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Keys currently present, optionally filtered by prefix.
    ///
    /// Ordering is unspecified. The remote tier strips its namespace
    /// prefix from the returned keys.
    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>>;

    /// Number of entries currently present.
    async fn get_size(&self) -> Result<u64>;

    /// Snapshot of this tier for stats reporting. Never fails; backends
    /// fold internal errors into the snapshot instead.
    async fn get_stats(&self) -> TierStats;

    /// Release held resources. Default is a no-op.
    async fn close(&self) {}
}

/// Stats snapshot of a single tier.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum TierStats {
    /// The tier is not configured on this cache.
    Disabled,
    Memory(MemoryStats),
    Remote(RemoteStats),
}

impl TierStats {
    pub fn enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Memory-tier counters.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub backend: &'static str,
    pub enabled: bool,
    pub policy: EvictionPolicy,
    pub size: u64,
    pub maxsize: u64,
    pub default_ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl MemoryStats {
    /// Hit rate as a percentage of all lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// How full the tier is, as a percentage of its capacity.
    pub fn usage_percent(&self) -> f64 {
        if self.maxsize == 0 {
            0.0
        } else {
            (self.size as f64 / self.maxsize as f64) * 100.0
        }
    }
}

/// Remote-tier snapshot.
///
/// `connected` reflects a ping at snapshot time; `size` is the number of
/// keys under the configured prefix and is `None` while unreachable.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteStats {
    pub backend: String,
    pub enabled: bool,
    pub connected: bool,
    pub endpoint: String,
    pub key_prefix: String,
    pub default_ttl_secs: u64,
    pub serializer: String,
    pub size: Option<u64>,
}
