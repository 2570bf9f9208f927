//! Circuit breaker guarding the remote tier.
//!
//! Repeated connection failures open the circuit; while open, remote
//! calls are short-circuited without touching the network. After the
//! reset timeout a single probe request is let through, and its outcome
//! decides whether the circuit closes again or reopens.
//!
//! Only connection failures count against the breaker. A value that
//! fails to decode proves connectivity worked, so it is recorded as a
//! success and the error is surfaced to the caller untouched.

use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{CacheError, Result};

/// Breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Failing; calls are short-circuited.
    Open,
    /// Probing; one request is allowed through.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Breaker tuning.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// When false the breaker is a transparent pass-through.
    pub enabled: bool,
    /// Consecutive connection failures that open the circuit.
    pub threshold: u32,
    /// How long the circuit stays open before admitting a probe.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

/// Point-in-time breaker snapshot for stats reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStats {
    pub enabled: bool,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub threshold: u32,
    pub reset_timeout_secs: u64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_started_at: Option<Instant>,
}

enum Admission {
    Allow,
    ShortCircuit,
}

/// Three-state gate wrapping remote-tier calls.
///
/// State is guarded by a mutex held only for transitions; the wrapped
/// future always runs outside the lock, so slow network calls never
/// block observers or other callers' admission checks.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_started_at: None,
            }),
        }
    }

    /// Run `op` through the breaker.
    ///
    /// While the circuit is open the closure is not invoked and a
    /// connection error is returned immediately. Connection errors from
    /// `op` are recorded as failures; every other outcome is recorded as
    /// a success.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.config.enabled {
            return op().await;
        }

        match self.admit() {
            Admission::ShortCircuit => {
                debug!("circuit breaker open; request short-circuited");
                Err(CacheError::connection(
                    "circuit breaker is open; remote tier call short-circuited",
                ))
            }
            Admission::Allow => {
                let result = op().await;
                match &result {
                    Err(e) if e.is_connection() => self.record_failure(),
                    _ => self.record_success(),
                }
                result
            }
        }
    }

    fn admit(&self) -> Admission {
        let mut s = self.state.lock();
        match s.state {
            CircuitState::Closed => Admission::Allow,
            CircuitState::Open => {
                let elapsed = s
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(self.config.reset_timeout);
                if elapsed >= self.config.reset_timeout {
                    s.state = CircuitState::HalfOpen;
                    s.probe_started_at = Some(Instant::now());
                    info!("circuit breaker entering half-open state, probing remote tier");
                    Admission::Allow
                } else {
                    Admission::ShortCircuit
                }
            }
            CircuitState::HalfOpen => match s.probe_started_at {
                // A probe is in flight; everyone else waits.
                Some(started) if started.elapsed() < self.config.reset_timeout => {
                    Admission::ShortCircuit
                }
                // The previous probe was abandoned (caller dropped the
                // future); hand the slot to this caller.
                _ => {
                    s.probe_started_at = Some(Instant::now());
                    Admission::Allow
                }
            },
        }
    }

    fn record_success(&self) {
        if !self.config.enabled {
            return;
        }
        let mut s = self.state.lock();
        s.probe_started_at = None;
        if s.state != CircuitState::Closed {
            info!(state = %s.state, "circuit breaker closed after successful call");
        }
        s.state = CircuitState::Closed;
        if s.consecutive_failures > 0 {
            debug!(
                failures = s.consecutive_failures,
                "resetting breaker failure count"
            );
        }
        s.consecutive_failures = 0;
    }

    fn record_failure(&self) {
        if !self.config.enabled {
            return;
        }
        let mut s = self.state.lock();
        s.consecutive_failures += 1;
        warn!(
            failures = s.consecutive_failures,
            threshold = self.config.threshold,
            "remote tier failure recorded"
        );
        match s.state {
            CircuitState::HalfOpen => {
                s.state = CircuitState::Open;
                s.opened_at = Some(Instant::now());
                s.probe_started_at = None;
                error!("circuit breaker reopened after failed probe");
            }
            CircuitState::Closed if s.consecutive_failures >= self.config.threshold => {
                s.state = CircuitState::Open;
                s.opened_at = Some(Instant::now());
                error!(
                    failures = s.consecutive_failures,
                    "circuit breaker opened"
                );
            }
            _ => {}
        }
    }

    /// Current state. A disabled breaker always reports `Closed`.
    ///
    /// The open-to-half-open transition happens on a call attempt, so an
    /// observer may still see `Open` after the reset timeout elapsed.
    pub fn state(&self) -> CircuitState {
        if !self.config.enabled {
            return CircuitState::Closed;
        }
        self.state.lock().state
    }

    /// Snapshot of the breaker for stats reporting.
    pub fn stats(&self) -> BreakerStats {
        let s = self.state.lock();
        BreakerStats {
            enabled: self.config.enabled,
            state: if self.config.enabled {
                s.state
            } else {
                CircuitState::Closed
            },
            consecutive_failures: s.consecutive_failures,
            threshold: self.config.threshold,
            reset_timeout_secs: self.config.reset_timeout.as_secs(),
        }
    }

    /// Force the breaker back to its initial closed state.
    ///
    /// Intended for tests and manual recovery after maintenance.
    pub fn reset(&self) {
        let mut s = self.state.lock();
        s.state = CircuitState::Closed;
        s.consecutive_failures = 0;
        s.opened_at = None;
        s.probe_started_at = None;
        info!("circuit breaker manually reset to closed");
    }
}
