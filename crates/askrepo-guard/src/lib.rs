//! Composable resilience primitives: circuit breaker, rolling-window rate
//! limiter, bounded retry with backoff, and timeouts.
//!
//! Clients compose these around a raw call as
//! `rate_limit(circuit_break(retry(timeout(call))))`. The primitives are
//! error-agnostic so the vector store and repository host clients can each
//! map outcomes into their own error taxonomy.

pub mod breaker;
pub mod limiter;
pub mod retry;
pub mod timeout;

pub use breaker::CircuitBreaker;
pub use limiter::RateLimiter;
pub use retry::retry_with_backoff;
pub use timeout::with_timeout;
