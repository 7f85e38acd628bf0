//! The dispatcher: round-robin host selection, per-host circuit breaking,
//! and bounded cross-host retries, exposed as a [`tower::Service`].

use crate::config::{AttemptsConfig, BreakerConfig, RequestModifier};
use crate::correlation::CorrelationCarrier;
use crate::error::{AttemptFailure, BreakerError, HostError};
use crate::events::BreakerEvent;
use crate::host::Host;
use crate::request::BufferedRequest;
use crate::rounds::Rounds;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use roundbreaker_core::EventListeners;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Instant;
use tower::{Layer, Service};

/// A request handed to a [`Breaker`], with dispatch options the bare
/// `http::Request` type has no room for.
pub struct DispatchRequest {
    /// The request to send, body already in memory.
    pub request: Request<Bytes>,
    /// Overrides the configured default deadline for this request only.
    pub deadline: Option<Duration>,
    /// Correlation identifier stamped into events and, if configured, a
    /// request header.
    pub correlation_id: Option<String>,
}

impl DispatchRequest {
    /// Wraps a request with no deadline override and no correlation id.
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            deadline: None,
            correlation_id: None,
        }
    }

    /// Attaches a correlation identifier.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Overrides the default deadline for this request.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl CorrelationCarrier for DispatchRequest {
    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

/// Builds [`Breaker`] instances sharing one rotation, configuration, and
/// event sink across every inner service it wraps.
#[derive(Clone)]
pub struct BreakerLayer {
    rounds: Arc<Rounds>,
    config: Arc<BreakerConfig>,
    event_listeners: Arc<EventListeners<BreakerEvent>>,
}

impl BreakerLayer {
    /// Builds a layer from a validated configuration, with no listeners.
    pub fn new(config: BreakerConfig) -> Self {
        Self::with_listeners(config, EventListeners::new())
    }

    /// Builds a layer from a validated configuration and a pre-populated
    /// event sink.
    pub fn with_listeners(config: BreakerConfig, event_listeners: EventListeners<BreakerEvent>) -> Self {
        let event_listeners = Arc::new(event_listeners);
        let hosts = config
            .hosts
            .iter()
            .map(|host_config| match &host_config.attempts {
                AttemptsConfig::Delays(delays) => Host::new_with_schedule(
                    host_config.scheme.clone(),
                    host_config.host_port.clone(),
                    host_config.attempts.max_n(),
                    delays.clone(),
                    host_config.disabled_for,
                    Some(Arc::clone(&event_listeners)),
                ),
                AttemptsConfig::MaxN(_) => Host::new_with_listeners(
                    host_config.scheme.clone(),
                    host_config.host_port.clone(),
                    host_config.attempts.max_n(),
                    host_config.disabled_for,
                    Some(Arc::clone(&event_listeners)),
                ),
            })
            .collect();

        Self {
            rounds: Arc::new(Rounds::new(hosts)),
            config: Arc::new(config),
            event_listeners,
        }
    }
}

impl<S> Layer<S> for BreakerLayer {
    type Service = Breaker<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Breaker {
            inner,
            rounds: Arc::clone(&self.rounds),
            config: Arc::clone(&self.config),
            event_listeners: Arc::clone(&self.event_listeners),
        }
    }
}

/// A [`tower::Service`] that dispatches requests across a rotating pool of
/// hosts, disabling and re-enabling each independently as it fails and
/// recovers, and retrying across the pool until success or deadline.
#[derive(Clone)]
pub struct Breaker<S> {
    inner: S,
    rounds: Arc<Rounds>,
    config: Arc<BreakerConfig>,
    event_listeners: Arc<EventListeners<BreakerEvent>>,
}

impl<S> Breaker<S> {
    /// The number of hosts in rotation.
    pub fn host_count(&self) -> usize {
        self.rounds.len()
    }
}

fn apply_modifiers(headers: &mut http::HeaderMap, modifiers: &[RequestModifier], correlation_id: Option<&str>) {
    for modifier in modifiers {
        match modifier {
            RequestModifier::AddHeader { name, value } => {
                if let (Ok(name), Ok(value)) = (
                    http::HeaderName::try_from(name.as_str()),
                    http::HeaderValue::try_from(value.as_str()),
                ) {
                    headers.insert(name, value);
                }
            }
            RequestModifier::CorrelationIdHeader { name } => {
                if let Some(id) = correlation_id {
                    if let (Ok(name), Ok(value)) = (
                        http::HeaderName::try_from(name.as_str()),
                        http::HeaderValue::try_from(id),
                    ) {
                        headers.insert(name, value);
                    }
                }
            }
            RequestModifier::ContentType { value } => {
                if let Ok(value) = http::HeaderValue::try_from(value.as_str()) {
                    headers.insert(http::header::CONTENT_TYPE, value);
                }
            }
            RequestModifier::Authorization { value } => {
                if let Ok(value) = http::HeaderValue::try_from(value.as_str()) {
                    headers.insert(http::header::AUTHORIZATION, value);
                }
            }
        }
    }
}

impl<S, E> Service<DispatchRequest> for Breaker<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Response = Response<Bytes>;
    type Error = BreakerError<E>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness is per-host, decided inside `call` once a host is
        // chosen; the dispatcher itself is always ready to try.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, dispatch: DispatchRequest) -> Self::Future {
        let rounds = Arc::clone(&self.rounds);
        let config = Arc::clone(&self.config);
        let event_listeners = Arc::clone(&self.event_listeners);
        let inner = self.inner.clone();

        Box::pin(async move {
            let correlation_id = dispatch.correlation_id().map(str::to_owned);
            let deadline = Instant::now() + dispatch.deadline.unwrap_or(config.requests_default_ttl);

            let mut buffered = BufferedRequest::new(dispatch.request);
            apply_modifiers_to_envelope(&mut buffered, &config.request_modifiers, correlation_id.as_deref());

            let path = buffered.path_and_query().to_string();
            let start = std::time::Instant::now();

            if !config.observer.request_skipped {
                event_listeners.emit(&BreakerEvent::RequestBegin {
                    correlation_id: correlation_id.clone(),
                    url: path.clone(),
                    timestamp: std::time::Instant::now(),
                });
            }

            #[cfg(feature = "tracing")]
            {
                if config.observer.request_body_omitted {
                    tracing::debug!(url = %path, "dispatching request");
                } else {
                    tracing::debug!(url = %path, body_len = buffered.body_len(), "dispatching request");
                }
                for (name, value) in redacted_headers(buffered.headers(), &config.observer.sensitive_header_names) {
                    tracing::trace!(header = %name, value = %value, "request header");
                }
            }

            let mut last_error: Option<HostError<E>> = None;

            // RetryDriver: for the chosen host, call `Host::attempt` again
            // and again until it succeeds, exhausts its budget, or the
            // caller's deadline fires; only then does control return to
            // `Rounds` for the next host.
            let outcome = 'rotation: loop {
                let host = match rounds.next(deadline).await {
                    Ok(host) => host,
                    Err(_) => {
                        break 'rotation Err(BreakerError::DeadlineExceeded { last: last_error });
                    }
                };

                event_listeners.emit(&BreakerEvent::HostChosen {
                    correlation_id: correlation_id.clone(),
                    authority: host.authority().to_string(),
                    timestamp: std::time::Instant::now(),
                });

                loop {
                    let attempt_request = match buffered.for_host(host.scheme(), host.authority()) {
                        Ok(request) => request,
                        Err(_) => break,
                    };

                    let attempt_index = host.attempts_current() + 1;
                    let attempt_budget = host.attempts_max();
                    let attempt_start = std::time::Instant::now();

                    let mut inner_call = inner.clone();
                    let result = host
                        .attempt(move || async move {
                            match inner_call.call(attempt_request).await {
                                Ok(response) if response.status().as_u16() < 500 => Ok(response),
                                Ok(response) => Err(AttemptFailure::Server {
                                    status: response.status().as_u16(),
                                }),
                                Err(error) => Err(AttemptFailure::Transport(error)),
                            }
                        })
                        .await;

                    match result {
                        Ok(response) => {
                            event_listeners.emit(&BreakerEvent::AttemptOk {
                                correlation_id: correlation_id.clone(),
                                authority: host.authority().to_string(),
                                attempt_index,
                                attempt_budget,
                                status: response.status().as_u16(),
                                duration: attempt_start.elapsed(),
                                timestamp: std::time::Instant::now(),
                            });
                            break 'rotation Ok(response);
                        }
                        Err(HostError::Disabled) => {
                            // Disabled concurrently between rotation and
                            // this attempt; fall back to the next host.
                            break;
                        }
                        Err(err @ HostError::Attempt(_)) => {
                            event_listeners.emit(&BreakerEvent::AttemptFailedAwaitingRetry {
                                correlation_id: correlation_id.clone(),
                                authority: host.authority().to_string(),
                                attempt_index,
                                attempt_budget,
                                error: err.to_string(),
                                timestamp: std::time::Instant::now(),
                            });
                            last_error = Some(err);

                            if let Some(delay) = host.delay_after(attempt_index) {
                                let wake = std::cmp::min(deadline, Instant::now() + delay);
                                tokio::time::sleep_until(wake).await;
                                if Instant::now() >= deadline {
                                    break 'rotation Err(BreakerError::DeadlineExceeded { last: last_error });
                                }
                            }
                            // Otherwise retry this host immediately.
                        }
                        Err(err @ HostError::Exhausted(_)) => {
                            event_listeners.emit(&BreakerEvent::HostAttemptsExceeded {
                                correlation_id: correlation_id.clone(),
                                authority: host.authority().to_string(),
                                attempt_budget,
                                error: err.to_string(),
                                timestamp: std::time::Instant::now(),
                            });
                            last_error = Some(err);
                            break;
                        }
                    }
                }
            };

            buffered.restore();

            #[cfg(feature = "tracing")]
            if let Ok(response) = &outcome {
                if config.observer.response_body_omitted {
                    tracing::debug!(status = response.status().as_u16(), "request completed");
                } else {
                    tracing::debug!(
                        status = response.status().as_u16(),
                        body_len = response.body().len(),
                        "request completed"
                    );
                }
            }

            if !config.observer.response_skipped {
                event_listeners.emit(&BreakerEvent::RequestEnd {
                    correlation_id,
                    url: path,
                    duration: start.elapsed(),
                    status: outcome.as_ref().ok().map(|r| r.status().as_u16()),
                    error: outcome.as_ref().err().map(|e| e.to_string()),
                    timestamp: std::time::Instant::now(),
                });
            }

            outcome
        })
    }
}

fn apply_modifiers_to_envelope(buffered: &mut BufferedRequest, modifiers: &[RequestModifier], correlation_id: Option<&str>) {
    buffered.with_headers_mut(|headers| apply_modifiers(headers, modifiers, correlation_id));
}

#[cfg(feature = "tracing")]
fn redacted_headers<'a>(headers: &'a http::HeaderMap, sensitive: &'a [String]) -> impl Iterator<Item = (String, String)> + 'a {
    headers.iter().map(move |(name, value)| {
        let is_sensitive = sensitive.iter().any(|s| s.eq_ignore_ascii_case(name.as_str()));
        let value = if is_sensitive {
            "***".to_string()
        } else {
            value.to_str().unwrap_or("<non-utf8>").to_string()
        };
        (name.to_string(), value)
    })
}
