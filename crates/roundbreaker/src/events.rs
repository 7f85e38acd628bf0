//! Observability events emitted by the dispatcher.
//!
//! Event names are stable for test assertions and downstream listeners:
//! `request_begin`, `request_end`, `host_chosen`, `attempt_ok`,
//! `attempt_failed_awaiting_retry`, `host_attempts_exceeded`,
//! `host_attempts_exceeded_concurrently`.

use roundbreaker_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// One observable moment in a request's lifetime.
#[derive(Debug, Clone)]
pub enum BreakerEvent {
    /// A request entered the dispatcher.
    RequestBegin {
        /// Correlation identifier, if the caller carried one.
        correlation_id: Option<String>,
        /// The target URL's path, for emission without leaking the host.
        url: String,
        timestamp: Instant,
    },
    /// A request finished, successfully or not.
    RequestEnd {
        correlation_id: Option<String>,
        url: String,
        duration: Duration,
        /// Response status, if a response was obtained.
        status: Option<u16>,
        /// Error description, if the request ultimately failed.
        error: Option<String>,
        timestamp: Instant,
    },
    /// Rounds selected a host for the next attempt.
    HostChosen {
        correlation_id: Option<String>,
        authority: String,
        timestamp: Instant,
    },
    /// An attempt against a host succeeded.
    AttemptOk {
        correlation_id: Option<String>,
        authority: String,
        attempt_index: u32,
        attempt_budget: u32,
        status: u16,
        duration: Duration,
        timestamp: Instant,
    },
    /// An attempt failed but the host still has budget; a retry will follow.
    AttemptFailedAwaitingRetry {
        correlation_id: Option<String>,
        authority: String,
        attempt_index: u32,
        attempt_budget: u32,
        error: String,
        timestamp: Instant,
    },
    /// A host's attempt budget was spent; it transitions to disabled.
    HostAttemptsExceeded {
        correlation_id: Option<String>,
        authority: String,
        attempt_budget: u32,
        error: String,
        timestamp: Instant,
    },
    /// A host's pending disable was revoked by a concurrent successful probe.
    HostAttemptsExceededConcurrently {
        correlation_id: Option<String>,
        authority: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for BreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BreakerEvent::RequestBegin { .. } => "request_begin",
            BreakerEvent::RequestEnd { .. } => "request_end",
            BreakerEvent::HostChosen { .. } => "host_chosen",
            BreakerEvent::AttemptOk { .. } => "attempt_ok",
            BreakerEvent::AttemptFailedAwaitingRetry { .. } => "attempt_failed_awaiting_retry",
            BreakerEvent::HostAttemptsExceeded { .. } => "host_attempts_exceeded",
            BreakerEvent::HostAttemptsExceededConcurrently { .. } => {
                "host_attempts_exceeded_concurrently"
            }
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BreakerEvent::RequestBegin { timestamp, .. }
            | BreakerEvent::RequestEnd { timestamp, .. }
            | BreakerEvent::HostChosen { timestamp, .. }
            | BreakerEvent::AttemptOk { timestamp, .. }
            | BreakerEvent::AttemptFailedAwaitingRetry { timestamp, .. }
            | BreakerEvent::HostAttemptsExceeded { timestamp, .. }
            | BreakerEvent::HostAttemptsExceededConcurrently { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        "roundbreaker"
    }
}
