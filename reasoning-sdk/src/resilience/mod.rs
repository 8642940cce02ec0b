//! Resilience patterns for collaborator calls
//!
//! Transient failures (network, timeouts, rate limits, 5xx) are retried with
//! exponential backoff and jitter, bounded by an attempt count and a total
//! elapsed time.

mod retry;

pub use retry::{RetryConfig, RetryExecutor};
