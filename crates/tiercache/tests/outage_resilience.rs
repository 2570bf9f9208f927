//! Remote-tier outage behavior, no server required.
//!
//! The caches here point at an unreachable address. Callers must keep
//! working on the local tier, the breaker must open after the configured
//! number of failures, and an open breaker must short-circuit without
//! touching the network.

use std::time::Duration;

use tiercache::{
    CacheFactory, CacheFactoryConfig, CacheParams, CircuitState, TieredCache,
};

fn unreachable_factory() -> CacheFactory {
    CacheFactory::new(CacheFactoryConfig {
        l2_host: "127.0.0.1".to_string(),
        // Port 1 is never a Redis server; connections are refused fast.
        l2_port: 1,
        l2_connect_timeout: 1,
        l2_socket_timeout: 1,
        circuit_breaker_threshold: 2,
        circuit_breaker_timeout: 1,
        ..Default::default()
    })
    .unwrap()
}

fn outage_cache(prefix: &str) -> TieredCache {
    unreachable_factory()
        .create_cache(CacheParams {
            l2_key_prefix: prefix.to_string(),
            l1_enabled: true,
            l1_maxsize: 100,
            l1_ttl: 60,
            ..Default::default()
        })
        .unwrap()
}

#[tokio::test]
async fn test_reads_and_writes_survive_l2_outage() {
    let cache = outage_cache("outage_rw");

    cache.set("a", &1, None).await.unwrap();
    let value: i64 = cache.get("a").await.unwrap().unwrap();
    assert_eq!(value, 1);

    // Misses degrade to None instead of erroring.
    let missing: Option<i64> = cache.get("missing").await.unwrap();
    assert_eq!(missing, None);

    cache.delete("a").await.unwrap();
    let gone: Option<i64> = cache.get("a").await.unwrap();
    assert_eq!(gone, None);
}

#[tokio::test]
async fn test_breaker_opens_after_threshold_and_recovers_state() {
    let cache = outage_cache("outage_breaker");

    // Threshold is 2: the set and one read miss both fail remotely.
    cache.set("a", &1, None).await.unwrap();
    let _: Option<i64> = cache.get("m1").await.unwrap();

    let stats = cache.get_stats().await;
    assert_eq!(stats.circuit_breaker.state, CircuitState::Open);
    assert!(stats.circuit_breaker.consecutive_failures >= 2);

    // While open, remote calls are short-circuited; local data still
    // answers instantly.
    let started = std::time::Instant::now();
    let value: i64 = cache.get("a").await.unwrap().unwrap();
    assert_eq!(value, 1);
    let _: Option<i64> = cache.get("m2").await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));

    // After the reset timeout the next call probes and fails again,
    // reopening the circuit.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let _: Option<i64> = cache.get("m3").await.unwrap();
    assert_eq!(
        cache.get_stats().await.circuit_breaker.state,
        CircuitState::Open
    );
}

#[tokio::test]
async fn test_auxiliary_operations_absorb_outage() {
    let cache = outage_cache("outage_aux");

    cache.set("k", &"v", None).await.unwrap();

    assert!(cache.exists("k").await.unwrap());
    assert!(!cache.exists("absent").await.unwrap());

    let remaining = cache.get_ttl("k").await.unwrap().unwrap();
    assert!(remaining <= Duration::from_secs(60));

    let keys = cache.list_keys(None).await.unwrap();
    assert_eq!(keys, vec!["k".to_string()]);

    let cleared = cache.clear().await.unwrap();
    assert_eq!(cleared.l1_removed, 1);
    assert_eq!(cleared.l2_removed, 0);
}

#[tokio::test]
async fn test_conditional_set_falls_back_to_l1() {
    let cache = outage_cache("outage_nx");

    assert!(cache.set_if_not_exist("c", &"v1", None).await.unwrap());
    assert!(!cache.set_if_not_exist("c", &"v2", None).await.unwrap());

    let value: String = cache.get("c").await.unwrap().unwrap();
    assert_eq!(value, "v1");
}

#[tokio::test]
async fn test_set_surfaces_error_when_no_tier_accepts() {
    let cache = unreachable_factory()
        .create_cache(CacheParams {
            l2_key_prefix: "outage_naked".to_string(),
            l1_enabled: false,
            ..Default::default()
        })
        .unwrap();

    let err = cache.set("k", &1, None).await.unwrap_err();
    assert!(err.is_connection());
}

#[tokio::test]
async fn test_stats_reflect_disconnected_remote() {
    let cache = outage_cache("outage_stats");

    let stats = cache.get_stats().await;
    match stats.l2 {
        tiercache::TierStats::Remote(remote) => {
            assert!(!remote.connected);
            assert_eq!(remote.size, None);
        }
        other => panic!("expected remote stats, got {other:?}"),
    }
}
