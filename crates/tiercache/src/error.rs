use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error types for cache operations.
///
/// Connection failures are liveness conditions: the coordinator absorbs
/// them and degrades to the local tier. Serialization failures indicate a
/// data-format defect and are always surfaced. Configuration failures are
/// raised at construction time only.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Remote-tier connectivity, timeout, auth, or protocol failure.
    /// Also raised when the circuit breaker short-circuits a call.
    #[error("cache connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Value could not be converted to or from its stored representation.
    #[error("cache serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Invalid configuration detected while building a cache.
    #[error("cache configuration error: {0}")]
    Configuration(String),

    /// Caller-side misuse, e.g. an empty key or a zero TTL.
    #[error("invalid cache argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    /// Create a new Connection error without an underlying cause.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Connection error wrapping an underlying cause.
    pub fn connection_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Serialization error without an underlying cause.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Serialization error wrapping an underlying cause.
    pub fn serialization_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new InvalidArgument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether this error is a remote-tier liveness failure.
    ///
    /// Only these count toward the circuit breaker and are absorbed by
    /// the coordinator.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Whether this error is a data-format failure.
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Whether this error was detected at construction time.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<deadpool_redis::redis::RedisError> for CacheError {
    fn from(e: deadpool_redis::redis::RedisError) -> Self {
        Self::connection_with("redis command failed", e)
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        Self::connection_with("failed to acquire redis connection", e)
    }
}

/// Convenience result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
