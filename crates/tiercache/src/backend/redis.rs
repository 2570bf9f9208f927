//! Remote cache tier over Redis/Valkey.
//!
//! Every key is namespaced under the configured prefix, so multiple
//! caches (or applications) can share one server without stepping on
//! each other. Values are encoded by the configured serializer right
//! before the write and decoded right after a successful read.
//!
//! Error classification matters here: network, pool, and timeout
//! failures become connection errors (the breaker's food), while decode
//! failures become serialization errors and bypass the breaker.
//!
//! Whole-prefix operations (`clear`, `get_size`, `list_keys`) walk the
//! keyspace with cursor-based `SCAN` to keep server blocking and client
//! memory bounded.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, Runtime, redis};
use deadpool_redis::redis::AsyncCommands;
use tracing::debug;

use super::{CacheBackend, RemoteStats, TierStats};
use crate::config::RemoteConfig;
use crate::error::{CacheError, Result};
use crate::serializer::{CacheValue, Serializer};

/// COUNT hint for SCAN; also the DEL batch size during clear.
const SCAN_BATCH: usize = 100;

/// Connections kept by the pool. Sized independently of cache settings.
const POOL_SIZE: usize = 16;

/// Remote cache tier backed by a Redis or Valkey server.
#[derive(Debug)]
pub struct RedisBackend {
    pool: Pool,
    config: RemoteConfig,
    serializer: Arc<dyn Serializer>,
    endpoint: String,
}

impl RedisBackend {
    /// Build the backend and its connection pool.
    ///
    /// No connection is attempted here; an unreachable server is a
    /// runtime liveness condition, not a construction error.
    pub fn new(config: RemoteConfig, serializer: Arc<dyn Serializer>) -> Result<Self> {
        let url = match &config.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, config.host, config.port, config.db
            ),
            None => format!("redis://{}:{}/{}", config.host, config.port, config.db),
        };

        let mut pool_config = deadpool_redis::PoolConfig::new(POOL_SIZE);
        pool_config.timeouts.wait = Some(config.connect_timeout);
        pool_config.timeouts.create = Some(config.connect_timeout);

        let mut pool_builder = deadpool_redis::Config::from_url(url);
        pool_builder.pool = Some(pool_config);
        let pool = pool_builder
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| {
                CacheError::configuration(format!("invalid {} connection settings: {e}", config.backend))
            })?;

        let endpoint = format!("{}:{}/{}", config.host, config.port, config.db);
        Ok(Self {
            pool,
            config,
            serializer,
            endpoint,
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }

    fn scan_pattern(&self, prefix: Option<&str>) -> String {
        match prefix {
            Some(p) => format!("{}:{p}*", self.config.key_prefix),
            None => format!("{}:*", self.config.key_prefix),
        }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            CacheError::connection_with(
                format!("failed to acquire connection to {} ({})", self.endpoint, self.config.backend),
                e,
            )
        })
    }

    /// Run one command future under the socket timeout, classifying
    /// failures as connection errors.
    async fn run<T>(
        &self,
        what: &str,
        fut: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.socket_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::connection_with(
                format!("{what} failed against {}", self.endpoint),
                e,
            )),
            Err(_) => Err(CacheError::connection(format!(
                "{what} timed out after {:?} against {}",
                self.config.socket_timeout, self.endpoint
            ))),
        }
    }

    fn effective_ttl_secs(&self, ttl: Option<Duration>) -> u64 {
        ttl.unwrap_or(self.config.ttl).as_secs()
    }

    /// Liveness probe.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = self
            .run("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let full_key = self.full_key(key);
        let mut conn = self.conn().await?;
        let data: Option<Vec<u8>> = self.run("GET", conn.get(&full_key)).await?;

        match data {
            None => {
                debug!(key = %key, "L2 cache miss");
                Ok(None)
            }
            Some(bytes) => {
                let value = self.serializer.deserialize(&bytes).map_err(|e| {
                    CacheError::serialization_with(
                        format!(
                            "failed to deserialize value for key '{key}' with {}",
                            self.serializer.name()
                        ),
                        e,
                    )
                })?;
                debug!(key = %key, "L2 cache hit");
                Ok(Some(value))
            }
        }
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> Result<()> {
        let data = self.serializer.serialize(&value)?;
        let ttl_secs = self.effective_ttl_secs(ttl);
        let full_key = self.full_key(key);

        let mut conn = self.conn().await?;
        let _: () = self.run("SET", conn.set_ex(&full_key, data, ttl_secs)).await?;
        debug!(key = %key, ttl_secs, "L2 cache set");
        Ok(())
    }

    async fn set_if_not_exist(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let data = self.serializer.serialize(&value)?;
        let ttl_secs = self.effective_ttl_secs(ttl);
        let full_key = self.full_key(key);

        let mut conn = self.conn().await?;
        // SET NX EX is the server-side atomic conditional set; the reply
        // is nil when the key already existed.
        let reply: Option<String> = self
            .run(
                "SET NX",
                redis::cmd("SET")
                    .arg(&full_key)
                    .arg(data)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl_secs)
                    .query_async(&mut conn),
            )
            .await?;

        let stored = reply.is_some();
        debug!(key = %key, stored, "L2 conditional set");
        Ok(stored)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let full_key = self.full_key(key);
        let mut conn = self.conn().await?;
        let removed: i64 = self.run("DEL", conn.del(&full_key)).await?;
        debug!(key = %key, removed, "L2 cache delete");
        Ok(removed > 0)
    }

    async fn clear(&self) -> Result<u64> {
        let pattern = self.scan_pattern(None);
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = self
                .run(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn),
                )
                .await?;

            if !batch.is_empty() {
                let deleted: i64 = self
                    .run("DEL", redis::cmd("DEL").arg(&batch).query_async(&mut conn))
                    .await?;
                removed += deleted as u64;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(removed, prefix = %self.config.key_prefix, "L2 cache cleared");
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_key = self.full_key(key);
        let mut conn = self.conn().await?;
        let present: bool = self.run("EXISTS", conn.exists(&full_key)).await?;
        Ok(present)
    }

    async fn get_ttl(&self, key: &str) -> Result<Option<Duration>> {
        let full_key = self.full_key(key);
        let mut conn = self.conn().await?;
        let ttl: i64 = self.run("TTL", conn.ttl(&full_key)).await?;

        // -2: key absent, -1: key present without expiry.
        if ttl < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(ttl as u64)))
        }
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let pattern = self.scan_pattern(prefix);
        let namespace = format!("{}:", self.config.key_prefix);
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = self
                .run(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn),
                )
                .await?;

            keys.extend(batch.into_iter().map(|key| {
                key.strip_prefix(&namespace)
                    .map(str::to_string)
                    .unwrap_or(key)
            }));

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }

    async fn get_size(&self) -> Result<u64> {
        let pattern = self.scan_pattern(None);
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut total: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = self
                .run(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn),
                )
                .await?;

            total += batch.len() as u64;
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(total)
    }

    async fn get_stats(&self) -> TierStats {
        let connected = self.ping().await.is_ok();
        let size = if connected {
            self.get_size().await.ok()
        } else {
            None
        };

        TierStats::Remote(RemoteStats {
            backend: self.config.backend.to_string(),
            enabled: true,
            connected,
            endpoint: self.endpoint.clone(),
            key_prefix: self.config.key_prefix.clone(),
            default_ttl_secs: self.config.ttl.as_secs(),
            serializer: self.serializer.name().to_string(),
            size,
        })
    }

    async fn close(&self) {
        self.pool.close();
        debug!(endpoint = %self.endpoint, "L2 connection pool closed");
    }
}
