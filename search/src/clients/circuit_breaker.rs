use crate::errors::SourceError;
use parking_lot::Mutex;
use screener_config::CircuitSettings;
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Per-source circuit breaker.
///
/// Closed until `fail_max` consecutive failures, then Open for
/// `reset_timeout`. After the cooldown a single probe call is let through
/// (HalfOpen): success closes the circuit, failure re-opens it.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    fail_max: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, fail_max: u32, reset_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            fail_max: fail_max.max(1),
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn from_settings(name: impl Into<String>, settings: &CircuitSettings) -> Self {
        Self::new(name, settings.fail_max, settings.reset_timeout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state; an Open circuit past its cooldown reports HalfOpen
    pub fn state(&self) -> CircuitState {
        let inner = self.inner.lock();
        match inner.state {
            CircuitState::Open if self.cooled_down(&inner) => CircuitState::HalfOpen,
            state => state,
        }
    }

    fn cooled_down(&self, inner: &BreakerInner) -> bool {
        inner
            .opened_at
            .map(|at| at.elapsed() >= self.reset_timeout)
            .unwrap_or(true)
    }

    /// Ask permission for one call
    pub fn try_acquire(&self) -> Result<(), SourceError> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open if self.cooled_down(&inner) => {
                inner.state = CircuitState::HalfOpen;
                inner.probe_in_flight = true;
                tracing::info!(breaker = %self.name, "Circuit breaker half-open, probing");
                Ok(())
            }
            CircuitState::HalfOpen if !inner.probe_in_flight => {
                inner.probe_in_flight = true;
                Ok(())
            }
            _ => Err(SourceError::CircuitOpen(self.name.clone())),
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!(breaker = %self.name, "Circuit breaker closed");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probe_in_flight = false;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.probe_in_flight = false;

        let should_open = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.consecutive_failures >= self.fail_max,
            CircuitState::Open => false,
        };

        if should_open {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            tracing::warn!(
                breaker = %self.name,
                failures = inner.consecutive_failures,
                reset_timeout_secs = self.reset_timeout.as_secs_f64(),
                "Circuit breaker opened"
            );
        }
    }

    /// Run `op` through the breaker. Failures that say nothing about the
    /// source's health release a half-open probe without counting.
    pub async fn call<F, Fut, T>(&self, op: F) -> Result<T, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        self.try_acquire()?;
        let mut guard = CallGuard {
            breaker: self,
            settled: false,
        };
        let result = op().await;
        guard.settled = true;

        match result {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                if e.trips_breaker() {
                    self.record_failure();
                } else {
                    self.inner.lock().probe_in_flight = false;
                }
                Err(e)
            }
        }
    }
}

/// Counts a call as failed when its future is dropped before completing,
/// e.g. when the caller's deadline fires. Releases the half-open slot.
struct CallGuard<'a> {
    breaker: &'a CircuitBreaker,
    settled: bool,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(breaker = %self.breaker.name, "Call abandoned before completion");
            self.breaker.record_failure();
        }
    }
}
