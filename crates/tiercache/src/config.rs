//! Configuration types.
//!
//! All validation happens when a factory or cache is built. A
//! misconfigured cache never gets constructed, and configuration
//! problems never surface as runtime errors.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::EvictionPolicy;
use crate::error::{CacheError, Result};
use crate::serializer::{Serializer, list_serializers};

/// Remote-tier protocol variant.
///
/// Redis and Valkey speak the same wire protocol; the distinction only
/// shows up in logs and stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteBackendKind {
    Redis,
    Valkey,
}

impl fmt::Display for RemoteBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Valkey => write!(f, "valkey"),
        }
    }
}

impl std::str::FromStr for RemoteBackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "valkey" => Ok(Self::Valkey),
            other => Err(CacheError::configuration(format!(
                "unknown l2_backend '{other}', expected 'redis' or 'valkey'"
            ))),
        }
    }
}

/// Serializer selection: a registered name or a pre-built instance.
#[derive(Clone)]
pub enum SerializerChoice {
    Name(String),
    Instance(Arc<dyn Serializer>),
}

impl SerializerChoice {
    pub fn name(&self) -> Result<String> {
        match self {
            Self::Name(name) => {
                let name = name.to_ascii_lowercase();
                if list_serializers().contains(&name) {
                    Ok(name)
                } else {
                    Err(CacheError::configuration(format!(
                        "serializer must be one of [{}] or a Serializer instance, got '{name}'",
                        list_serializers().join(", ")
                    )))
                }
            }
            Self::Instance(instance) => Ok(instance.name().to_string()),
        }
    }
}

impl fmt::Debug for SerializerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "SerializerChoice::Name({name})"),
            Self::Instance(instance) => write!(f, "SerializerChoice::Instance({})", instance.name()),
        }
    }
}

impl Default for SerializerChoice {
    fn default() -> Self {
        Self::Name("msgpack".to_string())
    }
}

impl From<&str> for SerializerChoice {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<Arc<dyn Serializer>> for SerializerChoice {
    fn from(instance: Arc<dyn Serializer>) -> Self {
        Self::Instance(instance)
    }
}

/// Resolved remote-tier settings handed to the backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub backend: RemoteBackendKind,
    pub host: String,
    pub port: u16,
    pub db: u32,
    pub password: Option<String>,
    pub key_prefix: String,
    pub ttl: Duration,
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
}

/// Process-wide defaults applied to every cache a factory creates.
///
/// Timeouts are whole seconds. Field names match the recognized
/// configuration surface; mapping environment keys onto them is the
/// host application's concern.
#[derive(Debug, Clone)]
pub struct CacheFactoryConfig {
    pub l2_backend: RemoteBackendKind,
    pub l2_host: String,
    pub l2_port: u16,
    pub l2_db: u32,
    pub l2_password: Option<String>,
    pub l2_connect_timeout: u64,
    pub l2_socket_timeout: u64,
    pub l1_backend: EvictionPolicy,
    pub serializer: SerializerChoice,
    pub circuit_breaker_enabled: bool,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_timeout: u64,
}

impl Default for CacheFactoryConfig {
    fn default() -> Self {
        Self {
            l2_backend: RemoteBackendKind::Redis,
            l2_host: "localhost".to_string(),
            l2_port: 6379,
            l2_db: 0,
            l2_password: None,
            l2_connect_timeout: 5,
            l2_socket_timeout: 5,
            l1_backend: EvictionPolicy::Ttl,
            serializer: SerializerChoice::default(),
            circuit_breaker_enabled: true,
            circuit_breaker_threshold: 5,
            circuit_breaker_timeout: 60,
        }
    }
}

impl CacheFactoryConfig {
    /// Check every field. Called by the factory constructor.
    pub fn validate(&self) -> Result<()> {
        if self.l2_host.trim().is_empty() {
            return Err(CacheError::configuration("l2_host must not be empty"));
        }
        if self.l2_port == 0 {
            return Err(CacheError::configuration("l2_port must not be zero"));
        }
        require_min(self.l2_connect_timeout, "l2_connect_timeout", 1)?;
        require_min(self.l2_socket_timeout, "l2_socket_timeout", 1)?;
        require_min(self.circuit_breaker_threshold as u64, "circuit_breaker_threshold", 1)?;
        require_min(self.circuit_breaker_timeout, "circuit_breaker_timeout", 1)?;
        self.serializer.name()?;
        Ok(())
    }
}

pub(crate) fn require_min(value: u64, name: &str, min: u64) -> Result<()> {
    if value < min {
        return Err(CacheError::configuration(format!(
            "{name} must be >= {min}, got {value}"
        )));
    }
    Ok(())
}
