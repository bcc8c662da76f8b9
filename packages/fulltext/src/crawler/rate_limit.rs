//! Per-host request spacing.
//!
//! Candidate attempts are interleaved across many concurrently-processed
//! stories; without this gate, two stories picking candidates on the same
//! host would issue near-simultaneous requests. The limiter keys on
//! hostname, so distinct hosts never block each other.

use std::time::Duration;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Enforces a minimum interval between requests to the same hostname.
pub struct HostRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl HostRateLimiter {
    /// Create a limiter allowing one request per `interval` per host.
    pub fn new(interval: Duration) -> Self {
        let quota = Quota::with_period(interval).expect("interval must be non-zero");
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Block the calling task until this host may be contacted again.
    ///
    /// A host seen for the first time proceeds immediately. An empty
    /// hostname is a no-op.
    pub async fn wait(&self, host: &str) {
        if host.is_empty() {
            return;
        }
        self.limiter.until_key_ready(&host.to_string()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn same_host_calls_are_spaced() {
        let limiter = HostRateLimiter::new(Duration::from_millis(150));

        let start = Instant::now();
        limiter.wait("example.com").await;
        limiter.wait("example.com").await;
        let elapsed = start.elapsed();

        assert!(
            elapsed >= Duration::from_millis(150),
            "second wait returned after only {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn different_hosts_do_not_block_each_other() {
        let limiter = HostRateLimiter::new(Duration::from_secs(3));

        let start = Instant::now();
        limiter.wait("a.example.com").await;
        limiter.wait("b.example.com").await;
        limiter.wait("c.example.com").await;
        let elapsed = start.elapsed();

        assert!(
            elapsed < Duration::from_millis(500),
            "distinct hosts blocked each other: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn empty_host_is_a_no_op() {
        let limiter = HostRateLimiter::new(Duration::from_secs(3));

        let start = Instant::now();
        limiter.wait("").await;
        limiter.wait("").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
