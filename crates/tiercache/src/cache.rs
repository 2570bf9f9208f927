//! Two-level cache coordinator.
//!
//! [`TieredCache`] is the handle applications hold. It sequences every
//! operation across the local tier (L1) and the remote tier (L2),
//! promotes remote hits into the local tier, and degrades to local-only
//! behavior whenever the remote tier is unreachable.
//!
//! ## Failure policy
//!
//! Remote connection failures are absorbed: they are logged, counted by
//! the circuit breaker, and reported through stats, but `get`, `set`,
//! `delete`, `exists`, `get_ttl`, `list_keys`, and `clear` keep working
//! on the local tier. The one exception is a write with no surviving
//! tier: when the local tier is disabled and the remote write fails,
//! the error propagates.
//!
//! Serialization failures are never absorbed. Stale connectivity is
//! expected; undecodable data is a defect that hiding would only make
//! harder to find.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::backend::{CacheBackend, TierStats};
use crate::breaker::{BreakerStats, CircuitBreaker};
use crate::error::{CacheError, Result};
use crate::serializer::CacheValue;

/// Longest accepted cache key, in bytes.
pub const MAX_KEY_BYTES: usize = 512;

/// Entries removed from each tier by [`TieredCache::clear`].
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ClearStats {
    pub l1_removed: u64,
    pub l2_removed: u64,
}

/// Combined snapshot returned by [`TieredCache::get_stats`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub l1: TierStats,
    pub l2: TierStats,
    pub circuit_breaker: BreakerStats,
}

/// Resilient two-level cache.
///
/// Reads try the local tier first and fall through to the remote tier;
/// remote hits are promoted locally. Writes go to both tiers. Built by
/// [`CacheFactory`](crate::factory::CacheFactory), or wired by hand from
/// backends for tests and special setups.
#[derive(Debug)]
pub struct TieredCache {
    l1: Option<Arc<dyn CacheBackend>>,
    l2: Option<Arc<dyn CacheBackend>>,
    breaker: CircuitBreaker,
    l1_ttl: Duration,
    l2_ttl: Duration,
}

impl TieredCache {
    /// Wire a cache from its parts.
    ///
    /// `l1_ttl` / `l2_ttl` are the per-tier defaults applied when a call
    /// does not carry an explicit TTL.
    pub fn new(
        l1: Option<Arc<dyn CacheBackend>>,
        l2: Option<Arc<dyn CacheBackend>>,
        breaker: CircuitBreaker,
        l1_ttl: Duration,
        l2_ttl: Duration,
    ) -> Self {
        Self {
            l1,
            l2,
            breaker,
            l1_ttl,
            l2_ttl,
        }
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::invalid_argument("cache key must not be empty"));
        }
        if key.len() > MAX_KEY_BYTES {
            return Err(CacheError::invalid_argument(format!(
                "cache key exceeds {MAX_KEY_BYTES} bytes"
            )));
        }
        Ok(())
    }

    fn validate_ttl(ttl: Option<Duration>) -> Result<()> {
        if ttl == Some(Duration::ZERO) {
            return Err(CacheError::invalid_argument("ttl must be positive"));
        }
        Ok(())
    }

    /// Fetch the raw value stored under `key`.
    ///
    /// Local tier first; on a local miss the remote tier is consulted
    /// through the circuit breaker and a hit is promoted into the local
    /// tier with its default TTL. Remote outages degrade to a miss.
    pub async fn get_value(&self, key: &str) -> Result<Option<CacheValue>> {
        Self::validate_key(key)?;

        if let Some(l1) = &self.l1 {
            if let Some(value) = l1.get(key).await? {
                debug!(key = %key, "L1 hit");
                return Ok(Some(value));
            }
        }

        if let Some(l2) = &self.l2 {
            match self.breaker.call(|| l2.get(key)).await {
                Ok(Some(value)) => {
                    if let Some(l1) = &self.l1 {
                        // Promotion is best-effort; a full or failing L1
                        // must not turn a remote hit into an error.
                        match l1.set(key, value.clone(), Some(self.l1_ttl)).await {
                            Ok(()) => debug!(key = %key, "promoted L2 hit into L1"),
                            Err(e) => warn!(key = %key, error = %e, "failed to promote into L1"),
                        }
                    }
                    return Ok(Some(value));
                }
                Ok(None) => {}
                Err(e) if e.is_connection() => {
                    warn!(key = %key, error = %e, "L2 get failed, degrading to L1-only");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(key = %key, "cache miss");
        Ok(None)
    }

    /// Fetch and decode the value stored under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_value(key).await? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                CacheError::serialization_with(
                    format!("cached value for key '{key}' does not match the requested type"),
                    e,
                )
            }),
            None => Ok(None),
        }
    }

    /// Store a raw value under `key` in every enabled tier.
    ///
    /// Write-through: the local tier is written first, then the remote
    /// tier through the circuit breaker. A remote connection failure is
    /// absorbed as long as some enabled tier accepted the write.
    pub async fn set_value(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<()> {
        Self::validate_key(key)?;
        Self::validate_ttl(ttl)?;

        let mut accepted = false;
        if let Some(l1) = &self.l1 {
            l1.set(key, value.clone(), Some(ttl.unwrap_or(self.l1_ttl)))
                .await?;
            debug!(key = %key, "stored in L1");
            accepted = true;
        }

        if let Some(l2) = &self.l2 {
            let l2_ttl = Some(ttl.unwrap_or(self.l2_ttl));
            match self.breaker.call(|| l2.set(key, value, l2_ttl)).await {
                Ok(()) => debug!(key = %key, "stored in L2"),
                Err(e) if e.is_connection() && accepted => {
                    warn!(key = %key, error = %e, "L2 set failed, entry lives in L1 only");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Encode and store a value under `key`.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let value = to_cache_value(key, value)?;
        self.set_value(key, value, ttl).await
    }

    /// Store a raw value only if `key` is absent, remote tier first.
    ///
    /// The remote tier is the source of truth for the existence test
    /// whenever it is reachable: its atomic conditional set decides, and
    /// a win is mirrored into the local tier. When the remote tier is
    /// unreachable the local tier decides on its own, best-effort.
    ///
    /// Returns whether the value was stored.
    pub async fn set_if_not_exist_value(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        Self::validate_key(key)?;
        Self::validate_ttl(ttl)?;

        let l1_ttl = Some(ttl.unwrap_or(self.l1_ttl));

        if let Some(l2) = &self.l2 {
            let l2_ttl = Some(ttl.unwrap_or(self.l2_ttl));
            match self
                .breaker
                .call(|| l2.set_if_not_exist(key, value.clone(), l2_ttl))
                .await
            {
                Ok(true) => {
                    if let Some(l1) = &self.l1 {
                        if let Err(e) = l1.set(key, value, l1_ttl).await {
                            warn!(key = %key, error = %e, "failed to mirror conditional set into L1");
                        }
                    }
                    return Ok(true);
                }
                Ok(false) => {
                    debug!(key = %key, "conditional set skipped, key already present in L2");
                    return Ok(false);
                }
                Err(e) if e.is_connection() => {
                    warn!(key = %key, error = %e, "L2 conditional set failed, falling back to L1");
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(l1) = &self.l1 {
            return l1.set_if_not_exist(key, value, l1_ttl).await;
        }
        Ok(false)
    }

    /// Encode and conditionally store a value under `key`.
    pub async fn set_if_not_exist<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let value = to_cache_value(key, value)?;
        self.set_if_not_exist_value(key, value, ttl).await
    }

    /// Remove `key` from every enabled tier, local tier first.
    ///
    /// Deleting L1 first means a read racing this call cannot resurrect
    /// the old value from the local fast path after the delete returns.
    pub async fn delete(&self, key: &str) -> Result<()> {
        Self::validate_key(key)?;

        if let Some(l1) = &self.l1 {
            l1.delete(key).await?;
        }

        if let Some(l2) = &self.l2 {
            match self.breaker.call(|| l2.delete(key)).await {
                Ok(removed) => debug!(key = %key, removed, "deleted from L2"),
                Err(e) if e.is_connection() => {
                    warn!(key = %key, error = %e, "L2 delete failed, key expires by TTL");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Remove every entry from both tiers.
    ///
    /// The remote tier only drops keys under this cache's prefix.
    pub async fn clear(&self) -> Result<ClearStats> {
        let mut stats = ClearStats::default();

        if let Some(l1) = &self.l1 {
            stats.l1_removed = l1.clear().await?;
        }

        if let Some(l2) = &self.l2 {
            match self.breaker.call(|| l2.clear()).await {
                Ok(removed) => stats.l2_removed = removed,
                Err(e) if e.is_connection() => {
                    warn!(error = %e, "L2 clear failed, remote entries expire by TTL");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(stats)
    }

    /// Whether `key` is present in any enabled tier. No promotion.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        Self::validate_key(key)?;

        if let Some(l1) = &self.l1 {
            if l1.exists(key).await? {
                return Ok(true);
            }
        }

        if let Some(l2) = &self.l2 {
            match self.breaker.call(|| l2.exists(key)).await {
                Ok(present) => return Ok(present),
                Err(e) if e.is_connection() => {
                    warn!(key = %key, error = %e, "L2 exists check failed");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(false)
    }

    /// Minimum remaining TTL across the enabled tiers that hold `key`.
    ///
    /// `None` when the key is absent everywhere, or when no holding tier
    /// reports a finite TTL.
    pub async fn get_ttl(&self, key: &str) -> Result<Option<Duration>> {
        Self::validate_key(key)?;

        let mut best: Option<Duration> = None;

        if let Some(l1) = &self.l1 {
            best = l1.get_ttl(key).await?;
        }

        if let Some(l2) = &self.l2 {
            match self.breaker.call(|| l2.get_ttl(key)).await {
                Ok(Some(remote)) => {
                    best = Some(best.map_or(remote, |local| local.min(remote)));
                }
                Ok(None) => {}
                Err(e) if e.is_connection() => {
                    warn!(key = %key, error = %e, "L2 ttl lookup failed");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(best)
    }

    /// Deduplicated union of the keys in both tiers. Unordered.
    pub async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let mut keys = HashSet::new();

        if let Some(l1) = &self.l1 {
            keys.extend(l1.list_keys(prefix).await?);
        }

        if let Some(l2) = &self.l2 {
            match self.breaker.call(|| l2.list_keys(prefix)).await {
                Ok(remote_keys) => keys.extend(remote_keys),
                Err(e) if e.is_connection() => {
                    warn!(error = %e, "L2 key listing failed, returning L1 keys only");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(keys.into_iter().collect())
    }

    /// Snapshot of both tiers and the circuit breaker.
    pub async fn get_stats(&self) -> CacheStats {
        let l1 = match &self.l1 {
            Some(backend) => backend.get_stats().await,
            None => TierStats::Disabled,
        };
        let l2 = match &self.l2 {
            Some(backend) => backend.get_stats().await,
            None => TierStats::Disabled,
        };

        CacheStats {
            l1,
            l2,
            circuit_breaker: self.breaker.stats(),
        }
    }

    /// Release backend resources. The cache must not be used afterwards.
    pub async fn close(&self) {
        if let Some(l2) = &self.l2 {
            l2.close().await;
        }
        if let Some(l1) = &self.l1 {
            l1.close().await;
        }
    }

    /// The breaker guarding remote-tier calls.
    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

fn to_cache_value<T: Serialize>(key: &str, value: &T) -> Result<CacheValue> {
    serde_json::to_value(value).map_err(|e| {
        CacheError::serialization_with(
            format!("value for key '{key}' is not representable in the cache"),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{EvictionPolicy, MemoryBackend};
    use crate::breaker::{CircuitBreakerConfig, CircuitState};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    const MINUTE: Duration = Duration::from_secs(60);

    /// Remote-tier stand-in that fails every call with a connection
    /// error and counts how often it was reached.
    #[derive(Debug)]
    struct DownBackend {
        calls: AtomicU64,
    }

    impl DownBackend {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
            }
        }

        fn fail<T>(&self) -> Result<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::connection("remote tier unreachable"))
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CacheBackend for DownBackend {
        async fn get(&self, _key: &str) -> Result<Option<CacheValue>> {
            self.fail()
        }
        async fn set(&self, _key: &str, _value: CacheValue, _ttl: Option<Duration>) -> Result<()> {
            self.fail()
        }
        async fn set_if_not_exist(
            &self,
            _key: &str,
            _value: CacheValue,
            _ttl: Option<Duration>,
        ) -> Result<bool> {
            self.fail()
        }
        async fn delete(&self, _key: &str) -> Result<bool> {
            self.fail()
        }
        async fn clear(&self) -> Result<u64> {
            self.fail()
        }
        async fn exists(&self, _key: &str) -> Result<bool> {
            self.fail()
        }
        async fn get_ttl(&self, _key: &str) -> Result<Option<Duration>> {
            self.fail()
        }
        async fn list_keys(&self, _prefix: Option<&str>) -> Result<Vec<String>> {
            self.fail()
        }
        async fn get_size(&self) -> Result<u64> {
            self.fail()
        }
        async fn get_stats(&self) -> TierStats {
            TierStats::Disabled
        }
    }

    fn l1_only(maxsize: usize) -> TieredCache {
        TieredCache::new(
            Some(Arc::new(MemoryBackend::new(
                maxsize,
                MINUTE,
                EvictionPolicy::Ttl,
            ))),
            None,
            CircuitBreaker::new(CircuitBreakerConfig::default()),
            MINUTE,
            Duration::from_secs(3600),
        )
    }

    fn with_down_l2(threshold: u32) -> (TieredCache, Arc<DownBackend>) {
        let down = Arc::new(DownBackend::new());
        let cache = TieredCache::new(
            Some(Arc::new(MemoryBackend::new(
                100,
                MINUTE,
                EvictionPolicy::Ttl,
            ))),
            Some(down.clone()),
            CircuitBreaker::new(CircuitBreakerConfig {
                enabled: true,
                threshold,
                reset_timeout: Duration::from_secs(60),
            }),
            MINUTE,
            Duration::from_secs(3600),
        );
        (cache, down)
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let cache = l1_only(100);

        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Payload {
            name: String,
            count: u32,
        }

        let payload = Payload {
            name: "widget".to_string(),
            count: 7,
        };
        cache.set("p", &payload, None).await.unwrap();

        let back: Payload = cache.get("p").await.unwrap().unwrap();
        assert_eq!(back, payload);
    }

    #[tokio::test]
    async fn test_get_miss_returns_none() {
        let cache = l1_only(100);
        let value: Option<String> = cache.get("absent").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_delete_get_is_miss() {
        let cache = l1_only(100);
        cache.set("k", &1, None).await.unwrap();
        cache.delete("k").await.unwrap();

        let value: Option<i64> = cache.get("k").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = l1_only(100);
        cache.set("k", &1, None).await.unwrap();
        cache.delete("k").await.unwrap();
        cache.delete("k").await.unwrap();

        let value: Option<i64> = cache.get("k").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_invalid_keys_rejected() {
        let cache = l1_only(100);

        let err = cache.set("", &1, None).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));

        let long_key = "k".repeat(MAX_KEY_BYTES + 1);
        let err = cache.get_value(&long_key).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let cache = l1_only(100);
        let err = cache
            .set("k", &1, Some(Duration::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_set_if_not_exist_l1_only() {
        let cache = l1_only(100);

        assert!(cache.set_if_not_exist("k", &"first", None).await.unwrap());
        assert!(!cache.set_if_not_exist("k", &"second", None).await.unwrap());

        let value: String = cache.get("k").await.unwrap().unwrap();
        assert_eq!(value, "first");
    }

    #[tokio::test]
    async fn test_l2_outage_is_absorbed() {
        let (cache, down) = with_down_l2(10);

        cache.set("a", &1, None).await.unwrap();
        let value: i64 = cache.get("a").await.unwrap().unwrap();
        assert_eq!(value, 1);

        // The read was served by L1; the only remote attempt so far was
        // the write.
        assert_eq!(down.calls(), 1);

        // A local miss falls through to the broken L2 and still degrades
        // to a miss instead of an error.
        let value: Option<i64> = cache.get("absent").await.unwrap();
        assert_eq!(value, None);

        cache.delete("a").await.unwrap();
        assert_eq!(cache.clear().await.unwrap().l2_removed, 0);
        assert!(!cache.exists("gone").await.unwrap());
        assert_eq!(cache.get_ttl("gone").await.unwrap(), None);
        assert!(cache.list_keys(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_l2_outage_with_l1_disabled_surfaces_on_set() {
        let down = Arc::new(DownBackend::new());
        let cache = TieredCache::new(
            None,
            Some(down),
            CircuitBreaker::new(CircuitBreakerConfig::default()),
            MINUTE,
            Duration::from_secs(3600),
        );

        let err = cache.set("k", &1, None).await.unwrap_err();
        assert!(err.is_connection());

        // Reads still degrade to a miss.
        let value: Option<i64> = cache.get("k").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_breaker_opens_and_short_circuits_l2() {
        let (cache, down) = with_down_l2(2);

        // Two local misses reach L2 and trip the breaker.
        let _: Option<i64> = cache.get("m1").await.unwrap();
        let _: Option<i64> = cache.get("m2").await.unwrap();
        assert_eq!(down.calls(), 2);

        let stats = cache.get_stats().await;
        assert_eq!(stats.circuit_breaker.state, CircuitState::Open);

        // Further misses are short-circuited without touching L2.
        let _: Option<i64> = cache.get("m3").await.unwrap();
        let _: Option<i64> = cache.get("m4").await.unwrap();
        assert_eq!(down.calls(), 2);
    }

    #[tokio::test]
    async fn test_set_if_not_exist_falls_back_to_l1_on_outage() {
        let (cache, down) = with_down_l2(10);

        assert!(cache.set_if_not_exist("k", &"v1", None).await.unwrap());
        assert!(!cache.set_if_not_exist("k", &"v2", None).await.unwrap());
        assert!(down.calls() >= 1);

        let value: String = cache.get("k").await.unwrap().unwrap();
        assert_eq!(value, "v1");
    }

    #[tokio::test]
    async fn test_get_ttl_prefers_minimum() {
        // L1 and a healthy in-memory "remote" tier with different TTLs.
        let l1 = Arc::new(MemoryBackend::new(100, MINUTE, EvictionPolicy::Ttl));
        let l2 = Arc::new(MemoryBackend::new(100, MINUTE, EvictionPolicy::Ttl));
        let cache = TieredCache::new(
            Some(l1.clone()),
            Some(l2.clone()),
            CircuitBreaker::new(CircuitBreakerConfig::default()),
            MINUTE,
            Duration::from_secs(3600),
        );

        l1.set("k", json!(1), Some(Duration::from_secs(500)))
            .await
            .unwrap();
        l2.set("k", json!(1), Some(Duration::from_secs(50)))
            .await
            .unwrap();

        let remaining = cache.get_ttl("k").await.unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(50));

        // A tier without the key contributes nothing.
        l2.set("only_l2", json!(2), Some(Duration::from_secs(30)))
            .await
            .unwrap();
        let remaining = cache.get_ttl("only_l2").await.unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_promotion_from_l2_preserves_value() {
        let l1 = Arc::new(MemoryBackend::new(100, MINUTE, EvictionPolicy::Ttl));
        let l2 = Arc::new(MemoryBackend::new(100, MINUTE, EvictionPolicy::Ttl));
        let cache = TieredCache::new(
            Some(l1.clone()),
            Some(l2.clone()),
            CircuitBreaker::new(CircuitBreakerConfig::default()),
            MINUTE,
            Duration::from_secs(3600),
        );

        l2.set("b", json!("x"), None).await.unwrap();

        let value: String = cache.get("b").await.unwrap().unwrap();
        assert_eq!(value, "x");

        // The hit was copied into L1.
        assert_eq!(l1.get("b").await.unwrap(), Some(json!("x")));
    }

    #[tokio::test]
    async fn test_list_keys_unions_both_tiers() {
        let l1 = Arc::new(MemoryBackend::new(100, MINUTE, EvictionPolicy::Ttl));
        let l2 = Arc::new(MemoryBackend::new(100, MINUTE, EvictionPolicy::Ttl));
        let cache = TieredCache::new(
            Some(l1.clone()),
            Some(l2.clone()),
            CircuitBreaker::new(CircuitBreakerConfig::default()),
            MINUTE,
            Duration::from_secs(3600),
        );

        l1.set("shared", json!(1), None).await.unwrap();
        l2.set("shared", json!(1), None).await.unwrap();
        l1.set("local", json!(2), None).await.unwrap();
        l2.set("remote", json!(3), None).await.unwrap();

        let mut keys = cache.list_keys(None).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["local", "remote", "shared"]);
    }

    #[tokio::test]
    async fn test_stats_report_disabled_tiers() {
        let cache = l1_only(100);
        let stats = cache.get_stats().await;

        assert!(stats.l1.enabled());
        assert!(!stats.l2.enabled());
        assert_eq!(stats.circuit_breaker.state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_eviction_bound_visible_through_handle() {
        let cache = l1_only(3);
        for i in 1..=5 {
            cache.set(&format!("k{i}"), &i, None).await.unwrap();
        }

        let TierStats::Memory(stats) = cache.get_stats().await.l1 else {
            panic!("expected memory stats");
        };
        assert_eq!(stats.size, 3);

        let v1: Option<i64> = cache.get("k1").await.unwrap();
        let v2: Option<i64> = cache.get("k2").await.unwrap();
        assert_eq!(v1, None);
        assert_eq!(v2, None);
    }
}
