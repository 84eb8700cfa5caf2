use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rolling-window rate limiter.
///
/// Caps calls to `max_calls` per `window`. [`RateLimiter::acquire`] waits for
/// capacity instead of dropping or erroring, so callers never lose work
/// silently; the wait is logged when it happens.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until the rolling window has room, then record this call.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut stamps = self.timestamps.lock().expect("limiter mutex poisoned");
                let now = Instant::now();
                while let Some(front) = stamps.front() {
                    if now.duration_since(*front) >= self.window {
                        stamps.pop_front();
                    } else {
                        break;
                    }
                }
                if stamps.len() < self.max_calls {
                    stamps.push_back(now);
                    None
                } else {
                    // Oldest entry leaving the window frees a slot.
                    stamps
                        .front()
                        .map(|front| self.window.saturating_sub(now.duration_since(*front)))
                }
            };

            match wait {
                None => return,
                Some(delay) => {
                    let delay_ms: u64 = delay.as_millis().try_into().unwrap_or(u64::MAX);
                    tracing::debug!(delay_ms, "rate limit reached, waiting");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Number of calls currently inside the rolling window.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        let mut stamps = self.timestamps.lock().expect("limiter mutex poisoned");
        let now = Instant::now();
        while let Some(front) = stamps.front() {
            if now.duration_since(*front) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }
        stamps.len()
    }
}
