//! Error sentinels surfaced by the dispatcher and its configuration.

use std::fmt;
use thiserror::Error;

/// Errors returned while attempting a single host.
#[derive(Debug, Error)]
pub enum HostError<E> {
    /// The host is currently disabled and was skipped.
    #[error("host is disabled")]
    Disabled,

    /// The host's attempt budget was spent without a successful response.
    ///
    /// Carries the last underlying failure observed before exhaustion.
    #[error("host attempts exceeded: {0}")]
    Exhausted(#[source] AttemptFailure<E>),

    /// The dispatcher returned an error, or a response with status >= 500.
    #[error(transparent)]
    Attempt(#[from] AttemptFailure<E>),
}

/// A single failed attempt: either a transport error or a 5xx response.
#[derive(Debug, Error)]
pub enum AttemptFailure<E> {
    /// The inner dispatcher service returned an error.
    #[error("transport error: {0}")]
    Transport(E),

    /// The dispatcher returned a response with status >= 500.
    #[error("server error: status {status}")]
    Server {
        /// The response status code.
        status: u16,
    },
}

/// Top-level error returned by [`crate::Breaker::do_request`] / `send`.
///
/// The dispatcher's retry loop never gives up on its own — it keeps
/// rotating across hosts, skipping disabled ones, until the caller's
/// deadline fires. So the only terminal failure surfaced here is the
/// deadline, joined with whatever per-host error was last observed.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The caller's deadline fired before a response was obtained.
    ///
    /// Carries the last per-host error observed, if any, joined for context.
    #[error("deadline exceeded{}", last_error_suffix(.last))]
    DeadlineExceeded {
        /// The last error observed from any host before the deadline fired.
        #[source]
        last: Option<HostError<E>>,
    },
}

fn last_error_suffix<E: fmt::Display>(last: &Option<HostError<E>>) -> String {
    match last {
        Some(err) => format!(" (last error: {err})"),
        None => String::new(),
    }
}

impl<E> BreakerError<E> {
    /// True if this error resulted from the caller's deadline firing.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, BreakerError::DeadlineExceeded { .. })
    }
}

/// Errors raised while validating a [`crate::config::BreakerConfig`] or
/// [`crate::config::HostConfig`] at construction time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `requests_default_ttl` must be positive.
    #[error("requests_default_ttl must be a positive duration")]
    NonPositiveDefaultTtl,

    /// The host list must contain at least one entry.
    #[error("hosts must not be empty")]
    EmptyHosts,

    /// A host's `attempts_max` must be positive.
    #[error("host {authority} attempts_max must be positive")]
    NonPositiveAttemptsMax {
        /// The offending host's authority.
        authority: String,
    },

    /// A host's `disabled_for` must be positive.
    #[error("host {authority} disabled_for must be a positive duration")]
    NonPositiveDisabledFor {
        /// The offending host's authority.
        authority: String,
    },

    /// A legacy delay-schedule entry was non-positive.
    ///
    /// The older `delays` schema coerced these to 1ns; this crate rejects
    /// them instead.
    #[error("host {authority} has a non-positive delay at index {index}")]
    NonPositiveDelay {
        /// The offending host's authority.
        authority: String,
        /// The index of the offending delay in the schedule.
        index: usize,
    },
}
