//! Cache construction.
//!
//! A [`CacheFactory`] holds process-wide defaults (server address,
//! timeouts, breaker tuning, serializer) and stamps out [`TieredCache`]
//! instances with per-cache settings: key prefix, per-tier TTLs, tier
//! toggles, and capacity. Everything is validated here, so a cache that
//! constructs successfully never raises configuration errors later.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::backend::{CacheBackend, MemoryBackend, RedisBackend};
use crate::breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::cache::TieredCache;
use crate::config::{CacheFactoryConfig, RemoteConfig, SerializerChoice, require_min};
use crate::error::{CacheError, Result};
use crate::serializer::{Serializer, get_serializer};

/// Per-cache settings passed to [`CacheFactory::create_cache`].
///
/// TTLs and timeouts are whole seconds. `None` overrides fall back to
/// the factory defaults.
#[derive(Debug, Clone)]
pub struct CacheParams {
    /// Namespace for this cache's keys on the remote tier.
    pub l2_key_prefix: String,
    /// Default remote-tier TTL, seconds.
    pub l2_ttl: u64,
    pub l2_enabled: bool,
    pub l1_enabled: bool,
    /// Local-tier capacity, entries.
    pub l1_maxsize: usize,
    /// Default local-tier TTL, seconds.
    pub l1_ttl: u64,
    /// Override of the factory's serializer for this cache.
    pub serializer: Option<SerializerChoice>,
    pub circuit_breaker_enabled: Option<bool>,
    pub circuit_breaker_threshold: Option<u32>,
    pub circuit_breaker_timeout: Option<u64>,
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            l2_key_prefix: "cache".to_string(),
            l2_ttl: 3600,
            l2_enabled: true,
            l1_enabled: false,
            l1_maxsize: 1000,
            l1_ttl: 60,
            serializer: None,
            circuit_breaker_enabled: None,
            circuit_breaker_threshold: None,
            circuit_breaker_timeout: None,
        }
    }
}

/// Builds ready-to-use caches from validated configuration.
#[derive(Debug)]
pub struct CacheFactory {
    config: CacheFactoryConfig,
}

impl CacheFactory {
    /// Validate the defaults and create a factory.
    pub fn new(config: CacheFactoryConfig) -> Result<Self> {
        config.validate()?;
        info!(
            l2_backend = %config.l2_backend,
            l1_backend = %config.l1_backend,
            "cache factory initialized"
        );
        Ok(Self { config })
    }

    /// The factory defaults.
    pub fn config(&self) -> &CacheFactoryConfig {
        &self.config
    }

    /// Validate `params`, wire the tiers, and return the cache handle.
    ///
    /// No connection attempt is made here; an unreachable server shows
    /// up as degraded behavior at call time, not as a build failure.
    pub fn create_cache(&self, params: CacheParams) -> Result<TieredCache> {
        if params.l2_key_prefix.trim().is_empty() {
            return Err(CacheError::configuration("l2_key_prefix must not be empty"));
        }
        if params.l2_enabled {
            require_min(params.l2_ttl, "l2_ttl", 1)?;
        }
        if params.l1_enabled {
            require_min(params.l1_maxsize as u64, "l1_maxsize", 1)?;
            require_min(params.l1_ttl, "l1_ttl", 1)?;
        }

        let breaker_config = self.breaker_config(&params)?;
        let serializer = self.resolve_serializer(params.serializer.as_ref())?;

        let l1: Option<Arc<dyn CacheBackend>> = params.l1_enabled.then(|| {
            Arc::new(MemoryBackend::new(
                params.l1_maxsize,
                Duration::from_secs(params.l1_ttl),
                self.config.l1_backend,
            )) as Arc<dyn CacheBackend>
        });

        let l2: Option<Arc<dyn CacheBackend>> = if params.l2_enabled {
            let remote_config = RemoteConfig {
                backend: self.config.l2_backend,
                host: self.config.l2_host.clone(),
                port: self.config.l2_port,
                db: self.config.l2_db,
                password: self.config.l2_password.clone(),
                key_prefix: params.l2_key_prefix.clone(),
                ttl: Duration::from_secs(params.l2_ttl),
                connect_timeout: Duration::from_secs(self.config.l2_connect_timeout),
                socket_timeout: Duration::from_secs(self.config.l2_socket_timeout),
            };
            Some(Arc::new(RedisBackend::new(remote_config, serializer)?))
        } else {
            None
        };

        info!(
            prefix = %params.l2_key_prefix,
            l1_enabled = params.l1_enabled,
            l2_enabled = params.l2_enabled,
            "cache created"
        );

        Ok(TieredCache::new(
            l1,
            l2,
            CircuitBreaker::new(breaker_config),
            Duration::from_secs(params.l1_ttl),
            Duration::from_secs(params.l2_ttl),
        ))
    }

    fn breaker_config(&self, params: &CacheParams) -> Result<CircuitBreakerConfig> {
        let threshold = params
            .circuit_breaker_threshold
            .unwrap_or(self.config.circuit_breaker_threshold);
        let timeout = params
            .circuit_breaker_timeout
            .unwrap_or(self.config.circuit_breaker_timeout);
        require_min(threshold as u64, "circuit_breaker_threshold", 1)?;
        require_min(timeout, "circuit_breaker_timeout", 1)?;

        Ok(CircuitBreakerConfig {
            enabled: params
                .circuit_breaker_enabled
                .unwrap_or(self.config.circuit_breaker_enabled),
            threshold,
            reset_timeout: Duration::from_secs(timeout),
        })
    }

    fn resolve_serializer(
        &self,
        override_choice: Option<&SerializerChoice>,
    ) -> Result<Arc<dyn Serializer>> {
        let choice = override_choice.unwrap_or(&self.config.serializer);
        match choice {
            SerializerChoice::Name(name) => get_serializer(name),
            SerializerChoice::Instance(instance) => Ok(instance.clone()),
        }
    }
}
