use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
enum BreakerState {
    Closed { consecutive_failures: u32 },
    Open { opened_at: Instant },
    HalfOpen,
}

/// Circuit breaker over consecutive failures.
///
/// After `threshold` consecutive failures the breaker opens and
/// [`CircuitBreaker::try_acquire`] rejects calls for `cooldown`. Once the
/// cooldown elapses exactly one trial call is allowed through (half-open);
/// its outcome closes or re-opens the breaker, and further callers are
/// rejected until that outcome is recorded.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            state: Mutex::new(BreakerState::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    /// Whether a call may proceed. `false` means the breaker is open or a
    /// half-open trial is already in flight.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().expect("breaker mutex poisoned");
        match *state {
            BreakerState::Closed { .. } => true,
            BreakerState::Open { opened_at } if opened_at.elapsed() >= self.cooldown => {
                *state = BreakerState::HalfOpen;
                true
            }
            BreakerState::Open { .. } | BreakerState::HalfOpen => false,
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("breaker mutex poisoned");
        *state = BreakerState::Closed {
            consecutive_failures: 0,
        };
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("breaker mutex poisoned");
        match *state {
            BreakerState::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures + 1;
                if failures >= self.threshold {
                    tracing::warn!(failures, "circuit breaker opened");
                    *state = BreakerState::Open {
                        opened_at: Instant::now(),
                    };
                } else {
                    *state = BreakerState::Closed {
                        consecutive_failures: failures,
                    };
                }
            }
            BreakerState::HalfOpen => {
                tracing::warn!("circuit breaker reopened after failed trial");
                *state = BreakerState::Open {
                    opened_at: Instant::now(),
                };
            }
            BreakerState::Open { .. } => {}
        }
    }
}
