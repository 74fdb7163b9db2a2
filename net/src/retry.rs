//! Retry policy and the backoff loop the session wraps `raw`/`exec`/`call`
//! in.
//!
//! No teacher precedent (`qail-pg` never retried) — grounded on the
//! policy shape named directly in spec.md §4.5 (`max_retries, base_delay,
//! backoff_factor, max_delay, retryable_kinds`), expressed the way
//! `qail-core`'s other small policy-ish structs are: a plain data struct
//! with a `Default` impl and consuming builder methods.

use std::collections::HashSet;
use std::time::Duration;
use vexdb_core::error::Error;

/// The error-family classification retry decisions are made against —
/// coarser than the full [`Error`] enum so a policy can say "retry
/// connection-family failures" without enumerating every leaf variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    Connection,
    Handshake,
    Authentication,
    Pool,
    Codec,
    Query,
    Model,
    Dsn,
    Discovery,
}

pub fn classify(err: &Error) -> ErrorFamily {
    match err {
        Error::Connection(_) => ErrorFamily::Connection,
        Error::Handshake(_) => ErrorFamily::Handshake,
        Error::Authentication(_) => ErrorFamily::Authentication,
        Error::Pool(_) => ErrorFamily::Pool,
        Error::Codec(_) => ErrorFamily::Codec,
        Error::Server(_) => ErrorFamily::Query,
        Error::Model(_) => ErrorFamily::Model,
        Error::Dsn(_) => ErrorFamily::Dsn,
        Error::Discovery(_) => ErrorFamily::Discovery,
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    pub retryable_kinds: HashSet<ErrorFamily>,
}

impl Default for RetryPolicy {
    /// Matches spec.md §4.5's default: only `ConnectionError` is retried,
    /// `QError` never is.
    fn default() -> Self {
        let mut retryable_kinds = HashSet::new();
        retryable_kinds.insert(ErrorFamily::Connection);
        RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(50),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(5),
            retryable_kinds,
        }
    }
}

impl RetryPolicy {
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base_delay(mut self, d: Duration) -> Self {
        self.base_delay = d;
        self
    }

    pub fn backoff_factor(mut self, f: f64) -> Self {
        self.backoff_factor = f;
        self
    }

    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_delay = d;
        self
    }

    pub fn retry_on(mut self, family: ErrorFamily) -> Self {
        self.retryable_kinds.insert(family);
        self
    }

    pub fn is_retryable(&self, err: &Error) -> bool {
        self.retryable_kinds.contains(&classify(err))
    }

    /// Delay before the `attempt`-th retry (0-based), per
    /// `min(max_delay, base_delay * backoff_factor^attempt)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexdb_core::error::{ConnectionError, QError};

    #[test]
    fn default_policy_retries_only_connection_family() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(&ConnectionError::Closed.into()));
        assert!(!policy.is_retryable(&QError("boom".into()).into()));
    }

    #[test]
    fn delay_grows_by_backoff_factor_and_caps_at_max() {
        let policy = RetryPolicy::default().base_delay(Duration::from_millis(10)).max_delay(Duration::from_millis(25));
        assert_eq!(policy.delay_for(0), Duration::from_millis(10));
        assert_eq!(policy.delay_for(1), Duration::from_millis(20));
        assert_eq!(policy.delay_for(5), Duration::from_millis(25));
    }
}
