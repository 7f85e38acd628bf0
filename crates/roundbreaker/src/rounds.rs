//! Global round-robin rotation across a fixed pool of hosts.

use crate::host::Host;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

/// Raised when the deadline fires while waiting for an enabled host.
#[derive(Debug, thiserror::Error)]
#[error("deadline exceeded while selecting a host")]
pub struct DeadlineExceeded;

/// Ordered rotation of hosts, shared across all in-flight requests so load
/// spreads under concurrency rather than restarting at index 0 per request.
pub struct Rounds {
    hosts: Vec<Arc<Host>>,
    cursor: AtomicUsize,
}

impl Rounds {
    /// Constructs a rotation over `hosts`. `hosts` must be non-empty;
    /// validation of that lives in [`crate::config`].
    pub fn new(hosts: Vec<Arc<Host>>) -> Self {
        Self {
            hosts,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of hosts in rotation.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// True if there are no hosts (a configuration error elsewhere).
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Returns the next enabled host, skipping disabled ones and cycling
    /// until either one is found or `deadline` fires.
    ///
    /// Cursor advancement is a single atomic fetch-and-add modulo
    /// `hosts.len()`, so concurrent callers always observe distinct
    /// successive indices; disabled hosts are skipped without consuming an
    /// extra cursor slot beyond the one spent probing them.
    pub async fn next(&self, deadline: Instant) -> Result<Arc<Host>, DeadlineExceeded> {
        loop {
            for _ in 0..self.hosts.len() {
                let index = self.advance();
                let host = &self.hosts[index];
                if host.enabled().await {
                    return Ok(Arc::clone(host));
                }
            }

            // Every host was disabled on this sweep; yield briefly and
            // re-check the deadline rather than declaring failure.
            let sleep = tokio::time::sleep_until(std::cmp::min(
                deadline,
                Instant::now() + std::time::Duration::from_millis(1),
            ));
            tokio::select! {
                _ = sleep => {}
                _ = tokio::time::sleep_until(deadline) => {}
            }
            if Instant::now() >= deadline {
                return Err(DeadlineExceeded);
            }
        }
    }

    fn advance(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed) % self.hosts.len()
    }
}
