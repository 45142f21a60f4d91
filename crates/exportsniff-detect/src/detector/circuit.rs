//! Circuit breaker around the detection pipeline.
//!
//! Closed: full pipeline. Open: cheap fallback only. The circuit opens after
//! `failure_threshold` consecutive failures and closes when the cooldown
//! elapses or any detection succeeds.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
}

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// A threshold of zero is treated as one.
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            state: Mutex::new(BreakerState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether calls must take the fallback path right now. An expired
    /// cooldown closes the circuit and clears the failure count.
    pub fn is_open(&self) -> bool {
        let mut state = self.lock();
        match state.opened_at {
            Some(at) if at.elapsed() < self.cooldown => true,
            Some(_) => {
                state.opened_at = None;
                state.consecutive_failures = 0;
                tracing::info!("detection circuit closed after cooldown");
                false
            }
            None => false,
        }
    }

    pub fn state(&self) -> CircuitState {
        if self.is_open() {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    /// Count a pipeline failure. Returns true if this failure opened the
    /// circuit.
    pub fn record_failure(&self) -> bool {
        let mut state = self.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if state.opened_at.is_none() && state.consecutive_failures >= self.failure_threshold {
            state.opened_at = Some(Instant::now());
            tracing::warn!(
                failures = state.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs_f64(),
                "detection circuit opened"
            );
            return true;
        }
        false
    }

    /// Reset after a successful detection, closing an open circuit.
    pub fn record_success(&self) {
        let mut state = self.lock();
        if state.opened_at.take().is_some() {
            tracing::info!("detection circuit closed after a successful detection");
        }
        state.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }
}
