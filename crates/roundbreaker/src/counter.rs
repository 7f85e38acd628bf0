//! Attempt accounting for a single host.

use std::sync::atomic::{AtomicU32, Ordering};

/// Counts attempts against a host's budget without ever needing a lock.
///
/// `current` only ever moves under a compare-and-swap loop, so concurrent
/// callers racing `next()` never observe a torn increment and never push
/// `current` past `max`.
#[derive(Debug)]
pub struct AttemptCounter {
    max: u32,
    current: AtomicU32,
}

impl AttemptCounter {
    /// Creates a counter with the given attempt budget.
    ///
    /// `max` must be positive; construction-time validation of that lives in
    /// [`crate::config`], not here.
    pub fn new(max: u32) -> Self {
        Self {
            max,
            current: AtomicU32::new(0),
        }
    }

    /// Consumes one attempt if the budget allows it.
    ///
    /// Returns `true` and increments `current` if `current < max`; otherwise
    /// returns `false` and leaves the counter unchanged.
    pub fn next(&self) -> bool {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return false;
            }
            if self
                .current
                .compare_exchange_weak(
                    current,
                    current + 1,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Resets the counter to zero.
    pub fn reset(&self) {
        self.current.store(0, Ordering::Release);
    }

    /// Returns true if the counter has reached its budget.
    pub fn exhausted(&self) -> bool {
        self.current.load(Ordering::Acquire) >= self.max
    }

    /// Returns true if at least one attempt has been consumed.
    pub fn attempted_at_least_once(&self) -> bool {
        self.current.load(Ordering::Acquire) > 0
    }

    /// Attempts consumed so far.
    pub fn current_n(&self) -> u32 {
        self.current.load(Ordering::Acquire)
    }

    /// The attempt budget.
    pub fn max_n(&self) -> u32 {
        self.max
    }
}
