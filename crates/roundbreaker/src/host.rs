//! A single backend endpoint: attempt accounting plus disable/re-enable timing.

use crate::counter::AttemptCounter;
use crate::error::{AttemptFailure, HostError};
use crate::events::BreakerEvent;
use roundbreaker_core::EventListeners;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

/// A host's enable state.
///
/// Modelled as a single enum rather than independent booleans so that
/// "exactly one outstanding re-enable timer while disabled" is structural:
/// there is nowhere in the type for a second `revoke` handle to live.
enum HostState {
    Enabled,
    Disabled { revoke: Arc<Notify> },
}

/// One backend endpoint in a [`crate::rounds::Rounds`] rotation.
pub struct Host {
    scheme: String,
    authority: String,
    counter: AttemptCounter,
    disabled_for: Duration,
    delays: Vec<Duration>,
    state: RwLock<HostState>,
    event_listeners: Option<Arc<EventListeners<BreakerEvent>>>,
}

impl Host {
    /// Constructs a host in the `Enabled` state, with no event sink and no
    /// inter-attempt delay schedule (retries against it are immediate).
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>, attempts_max: u32, disabled_for: Duration) -> Arc<Self> {
        Self::new_with_listeners(scheme, authority, attempts_max, disabled_for, None)
    }

    /// Constructs a host whose disable-revocation event is emitted through
    /// `event_listeners`, if given.
    pub fn new_with_listeners(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        attempts_max: u32,
        disabled_for: Duration,
        event_listeners: Option<Arc<EventListeners<BreakerEvent>>>,
    ) -> Arc<Self> {
        Self::new_with_schedule(scheme, authority, attempts_max, Vec::new(), disabled_for, event_listeners)
    }

    /// Constructs a host whose inter-attempt wait follows a fixed delay
    /// schedule (the legacy `AttemptsConfig::Delays` shape) instead of
    /// retrying immediately. `delays[i]` is the wait after attempt `i + 1`
    /// before attempt `i + 2`.
    pub fn new_with_schedule(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        attempts_max: u32,
        delays: Vec<Duration>,
        disabled_for: Duration,
        event_listeners: Option<Arc<EventListeners<BreakerEvent>>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            scheme: scheme.into(),
            authority: authority.into(),
            counter: AttemptCounter::new(attempts_max),
            disabled_for,
            delays,
            state: RwLock::new(HostState::Enabled),
            event_listeners,
        })
    }

    /// The configured wait after attempt `attempt_index` (1-based) before
    /// the next attempt against this host, or `None` if no delay schedule
    /// is configured (retry immediately).
    pub fn delay_after(&self, attempt_index: u32) -> Option<Duration> {
        self.delays.get(attempt_index as usize - 1).copied()
    }

    /// The host's scheme (e.g. `"http"`).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host's authority (`host[:port]`).
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// A snapshot of the current attempt count, for observability.
    pub fn attempts_current(&self) -> u32 {
        self.counter.current_n()
    }

    /// The attempt budget.
    pub fn attempts_max(&self) -> u32 {
        self.counter.max_n()
    }

    /// Snapshot read: is the host currently enabled?
    pub async fn enabled(&self) -> bool {
        matches!(*self.state.read().await, HostState::Enabled)
    }

    /// Invokes `f` against this host at most once.
    ///
    /// If the host is disabled, `f` is never called and `HostError::Disabled`
    /// is returned. On success the counter is reset (and any pending disable
    /// revoked); on failure the counter advances and, if that exhausts the
    /// budget, the host is disabled before the exhaustion error returns.
    pub async fn attempt<F, Fut, T, E>(self: &Arc<Self>, f: F) -> Result<T, HostError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AttemptFailure<E>>>,
    {
        if !self.enabled().await {
            return Err(HostError::Disabled);
        }

        match f().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(failure) => self.on_failure(failure).await,
        }
    }

    async fn on_success(&self) {
        let mut state = self.state.write().await;
        let revoked = if let HostState::Disabled { revoke } = &*state {
            // The attempt proved the host works, so the disable that raced
            // with it is revoked immediately rather than honored.
            revoke.notify_one();
            *state = HostState::Enabled;
            true
        } else {
            false
        };
        drop(state);

        if self.counter.attempted_at_least_once() {
            self.counter.reset();
        }

        if revoked {
            if let Some(listeners) = &self.event_listeners {
                listeners.emit(&BreakerEvent::HostAttemptsExceededConcurrently {
                    correlation_id: None,
                    authority: self.authority.clone(),
                    timestamp: std::time::Instant::now(),
                });
            }
        }
    }

    async fn on_failure<T, E>(self: &Arc<Self>, failure: AttemptFailure<E>) -> Result<T, HostError<E>> {
        let consumed = self.counter.next();
        if !consumed || self.counter.exhausted() {
            self.disable().await;
            return Err(HostError::Exhausted(failure));
        }

        Err(HostError::Attempt(failure))
    }

    /// Marks the host disabled and spawns its re-enable timer, unless one is
    /// already outstanding (idempotency guard against concurrent exhaustion).
    async fn disable(self: &Arc<Self>) {
        let mut state = self.state.write().await;
        if !matches!(&*state, HostState::Enabled) {
            return;
        }

        let revoke = Arc::new(Notify::new());
        *state = HostState::Disabled {
            revoke: Arc::clone(&revoke),
        };
        drop(state);

        let host = Arc::clone(self);
        let disabled_for = self.disabled_for;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(disabled_for) => {}
                _ = revoke.notified() => {}
            }

            let mut state = host.state.write().await;
            if matches!(&*state, HostState::Disabled { .. }) {
                *state = HostState::Enabled;
            }
        });
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("scheme", &self.scheme)
            .field("authority", &self.authority)
            .field("attempts_current", &self.attempts_current())
            .field("attempts_max", &self.attempts_max())
            .finish()
    }
}
