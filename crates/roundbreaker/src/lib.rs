//! A client-side HTTP dispatcher combining round-robin host selection,
//! per-host circuit breaking, and bounded cross-host retries behind a
//! single [`tower::Service`].
//!
//! Requests are buffered once and replayed against successive hosts drawn
//! from a shared rotation. Each host tracks its own attempt budget and
//! disables itself (with a timed, revocable re-enable) once that budget is
//! spent, independent of the other hosts in the pool.
//!
//! ```
//! use roundbreaker::{BreakerConfig, BreakerLayer, DispatchRequest, HostConfig};
//! use std::time::Duration;
//! use tower::{Layer, Service};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BreakerConfig::builder()
//!     .host(HostConfig::new("http", "backend-a:8080", 3, Duration::from_secs(30)))
//!     .host(HostConfig::new("http", "backend-b:8080", 3, Duration::from_secs(30)))
//!     .requests_default_ttl(Duration::from_secs(2))
//!     .build()?;
//!
//! let layer = BreakerLayer::new(config);
//! # Ok(())
//! # }
//! ```

mod breaker;
mod config;
mod correlation;
mod counter;
mod error;
mod events;
mod host;
mod request;
mod rounds;

pub use breaker::{Breaker, BreakerLayer, DispatchRequest};
pub use config::{
    AttemptsConfig, BreakerConfig, BreakerConfigBuilder, HostConfig, ObserverConfig, RequestModifier,
};
pub use correlation::{CorrelationCarrier, StaticCorrelationCarrier};
pub use error::{AttemptFailure, BreakerError, ConfigError, HostError};
pub use events::BreakerEvent;
pub use host::Host;
pub use request::BufferedRequest;
pub use rounds::{DeadlineExceeded, Rounds};

#[cfg(feature = "serde")]
pub use config::BreakerConfigParseError;
