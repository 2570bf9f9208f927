//! Value serialization strategies for the remote tier.
//!
//! The local tier stores values directly; only the remote tier needs a
//! byte representation. Serializers are looked up by name in a
//! process-wide registry, so applications can plug in their own wire
//! formats without touching the cache wiring.
//!
//! Two strategies ship with the crate:
//!
//! - `msgpack` (default): compact MessagePack binary via `rmp-serde`,
//!   round-trips every [`CacheValue`].
//! - `json`: human-readable UTF-8 JSON, restricted to the JSON data
//!   model. Handy when other tooling reads the same keys.
//!
//! The serializer name is not embedded in the stored bytes. Reading a key
//! space with a different serializer than the one that wrote it yields
//! serialization errors on read.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;

use crate::error::{CacheError, Result};

/// Interchange type for cached values.
///
/// The typed cache API converts application types to and from this
/// representation with serde; serializers convert it to and from bytes.
pub type CacheValue = serde_json::Value;

/// A named strategy for converting cache values to and from bytes.
pub trait Serializer: Send + Sync + std::fmt::Debug {
    /// Registry name of this serializer, lowercase.
    fn name(&self) -> &str;

    /// Encode a value into its stored byte representation.
    fn serialize(&self, value: &CacheValue) -> Result<Vec<u8>>;

    /// Decode stored bytes back into a value.
    fn deserialize(&self, bytes: &[u8]) -> Result<CacheValue>;
}

/// MessagePack serialization via `rmp-serde`.
///
/// Binary and compact; round-trips every [`CacheValue`] including large
/// integers. Not human-readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackSerializer;

impl Serializer for MsgpackSerializer {
    fn name(&self) -> &str {
        "msgpack"
    }

    fn serialize(&self, value: &CacheValue) -> Result<Vec<u8>> {
        rmp_serde::to_vec(value)
            .map_err(|e| CacheError::serialization_with("msgpack encoding failed", e))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<CacheValue> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| CacheError::serialization_with("msgpack decoding failed", e))
    }
}

/// JSON serialization via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, value: &CacheValue) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| CacheError::serialization_with("json encoding failed", e))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<CacheValue> {
        serde_json::from_slice(bytes)
            .map_err(|e| CacheError::serialization_with("json decoding failed", e))
    }
}

type SerializerFactory = Arc<dyn Fn() -> Arc<dyn Serializer> + Send + Sync>;

/// Process-wide registry, populated with the built-ins on first access.
/// Reads are lock-free per shard; writes only happen on registration.
static REGISTRY: LazyLock<DashMap<String, SerializerFactory>> = LazyLock::new(|| {
    let registry = DashMap::new();
    registry.insert(
        "msgpack".to_string(),
        Arc::new(|| Arc::new(MsgpackSerializer) as Arc<dyn Serializer>) as SerializerFactory,
    );
    registry.insert(
        "json".to_string(),
        Arc::new(|| Arc::new(JsonSerializer) as Arc<dyn Serializer>) as SerializerFactory,
    );
    registry
});

/// Register a serializer factory under a name.
///
/// Names are case-insensitive. Registering an existing name overwrites
/// the previous factory, which also allows replacing a built-in.
pub fn register_serializer<F>(name: &str, factory: F)
where
    F: Fn() -> Arc<dyn Serializer> + Send + Sync + 'static,
{
    REGISTRY.insert(name.to_ascii_lowercase(), Arc::new(factory));
}

/// Build a serializer instance from its registered name.
pub fn get_serializer(name: &str) -> Result<Arc<dyn Serializer>> {
    let key = name.to_ascii_lowercase();
    // Clone the factory out so it runs without holding the shard lock.
    let factory = REGISTRY.get(&key).map(|entry| entry.value().clone());
    match factory {
        Some(factory) => Ok(factory()),
        None => Err(CacheError::configuration(format!(
            "unknown serializer '{name}'; available: {}",
            list_serializers().join(", ")
        ))),
    }
}

/// Names of all registered serializers, sorted.
pub fn list_serializers() -> Vec<String> {
    let mut names: Vec<String> = REGISTRY.iter().map(|e| e.key().clone()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_values() -> Vec<CacheValue> {
        vec![
            json!(null),
            json!(true),
            json!(42),
            json!(-7),
            json!(u64::MAX),
            json!(2.5),
            json!("hello world"),
            json!([1, 2, 3]),
            json!({"nested": {"list": [1, "two", null], "flag": false}}),
        ]
    }

    #[test]
    fn test_msgpack_round_trip() {
        let serializer = MsgpackSerializer;
        for value in sample_values() {
            let bytes = serializer.serialize(&value).unwrap();
            let back = serializer.deserialize(&bytes).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let serializer = JsonSerializer;
        for value in sample_values() {
            let bytes = serializer.serialize(&value).unwrap();
            let back = serializer.deserialize(&bytes).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_deserialize_garbage_is_serialization_error() {
        let err = JsonSerializer.deserialize(b"{ not json").unwrap_err();
        assert!(err.is_serialization());

        let err = MsgpackSerializer.deserialize(&[0xc1]).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_cross_format_read_fails() {
        let value = json!({"name": "mismatch", "count": 3});
        let json_bytes = JsonSerializer.serialize(&value).unwrap();

        // JSON text is not valid MessagePack for any map-shaped payload.
        let err = MsgpackSerializer.deserialize(&json_bytes).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_registry_lookup() {
        let serializer = get_serializer("msgpack").unwrap();
        assert_eq!(serializer.name(), "msgpack");

        // Lookup is case-insensitive.
        let serializer = get_serializer("JSON").unwrap();
        assert_eq!(serializer.name(), "json");
    }

    #[test]
    fn test_registry_unknown_name() {
        let err = get_serializer("protobuf").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("protobuf"));
    }

    #[test]
    fn test_registry_lists_builtins() {
        let names = list_serializers();
        assert!(names.contains(&"msgpack".to_string()));
        assert!(names.contains(&"json".to_string()));
    }

    #[test]
    fn test_register_custom_serializer() {
        register_serializer("Custom-Json", || Arc::new(JsonSerializer));
        let serializer = get_serializer("custom-json").unwrap();
        assert_eq!(serializer.name(), "json");

        // Overwrite is permitted.
        register_serializer("custom-json", || Arc::new(MsgpackSerializer));
        let serializer = get_serializer("custom-json").unwrap();
        assert_eq!(serializer.name(), "msgpack");
    }
}
