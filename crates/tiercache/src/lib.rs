//! Resilient two-level caching.
//!
//! Entries are served from a fast in-process tier (L1) backed by a
//! shared Redis/Valkey tier (L2). Reads hit the nearest available tier,
//! remote hits are promoted locally, and a circuit breaker keeps a
//! failing remote server from dragging the application down.
//!
//! ## Architecture
//!
//! ```text
//! get/set/delete → TieredCache ──► L1 (MemoryBackend, ttl/lru eviction)
//!                       │
//!                       └─ CircuitBreaker ──► L2 (RedisBackend + Serializer)
//! ```
//!
//! ## Graceful degradation
//!
//! Remote connection failures never reach callers of `get`, `set`, or
//! `delete` while the local tier is enabled: they are logged, counted by
//! the breaker, and reported through [`TieredCache::get_stats`]. Data
//! errors (undecodable bytes) are surfaced, since hiding them would mask
//! real defects.
//!
//! ## Example
//!
//! ```ignore
//! use tiercache::{CacheFactory, CacheFactoryConfig, CacheParams};
//!
//! let factory = CacheFactory::new(CacheFactoryConfig::default())?;
//! let cache = factory.create_cache(CacheParams {
//!     l2_key_prefix: "users".to_string(),
//!     l2_ttl: 3600,
//!     l2_enabled: true,
//!     l1_enabled: true,
//!     l1_maxsize: 1000,
//!     l1_ttl: 60,
//!     ..Default::default()
//! })?;
//!
//! cache.set("alice", &profile, None).await?;
//! let profile: Option<Profile> = cache.get("alice").await?;
//! ```

pub mod backend;
pub mod breaker;
pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod serializer;

pub use backend::{
    CacheBackend, EvictionPolicy, MemoryBackend, MemoryStats, RedisBackend, RemoteStats, TierStats,
};
pub use breaker::{BreakerStats, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use cache::{CacheStats, ClearStats, MAX_KEY_BYTES, TieredCache};
pub use config::{CacheFactoryConfig, RemoteBackendKind, RemoteConfig, SerializerChoice};
pub use error::{CacheError, Result};
pub use factory::{CacheFactory, CacheParams};
pub use serializer::{
    CacheValue, JsonSerializer, MsgpackSerializer, Serializer, get_serializer, list_serializers,
    register_serializer,
};
