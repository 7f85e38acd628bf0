//! Declarative configuration for a [`crate::Breaker`].
//!
//! Mirrors the wire-config convention used elsewhere in this workspace:
//! plain serde structs with `humantime_serde` for `Duration` fields, so a
//! [`BreakerConfig`] round-trips through JSON or YAML unchanged.

use crate::error::ConfigError;
use std::time::Duration;

/// The attempt schedule for a single host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AttemptsConfig {
    /// A flat attempt budget: up to `n` tries before the host disables.
    MaxN(u32),
    /// A legacy per-attempt delay schedule; its length is the attempt budget.
    ///
    /// Every entry must be positive; an older schema coerced non-positive
    /// entries to 1ns, which this crate rejects instead.
    Delays(Vec<Duration>),
}

impl AttemptsConfig {
    /// The effective attempt budget this schedule implies.
    pub fn max_n(&self) -> u32 {
        match self {
            AttemptsConfig::MaxN(n) => *n,
            AttemptsConfig::Delays(delays) => delays.len() as u32,
        }
    }
}

/// Configuration for one backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostConfig {
    /// URL scheme, e.g. `"http"` or `"https"`.
    pub scheme: String,
    /// `host[:port]` authority.
    pub host_port: String,
    /// The attempt schedule before this host disables itself.
    pub attempts: AttemptsConfig,
    /// How long the host stays disabled before a probe is allowed again.
    #[cfg_attr(feature = "serde", serde(with = "humantime_serde"))]
    pub disabled_for: Duration,
}

impl HostConfig {
    /// Convenience constructor for the common flat-budget case.
    pub fn new(scheme: impl Into<String>, host_port: impl Into<String>, attempts_max: u32, disabled_for: Duration) -> Self {
        Self {
            scheme: scheme.into(),
            host_port: host_port.into(),
            attempts: AttemptsConfig::MaxN(attempts_max),
            disabled_for,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match &self.attempts {
            AttemptsConfig::MaxN(0) => {
                return Err(ConfigError::NonPositiveAttemptsMax {
                    authority: self.host_port.clone(),
                })
            }
            AttemptsConfig::Delays(delays) => {
                for (index, delay) in delays.iter().enumerate() {
                    if delay.is_zero() {
                        return Err(ConfigError::NonPositiveDelay {
                            authority: self.host_port.clone(),
                            index,
                        });
                    }
                }
                if delays.is_empty() {
                    return Err(ConfigError::NonPositiveAttemptsMax {
                        authority: self.host_port.clone(),
                    });
                }
            }
            AttemptsConfig::MaxN(_) => {}
        }

        if self.disabled_for.is_zero() {
            return Err(ConfigError::NonPositiveDisabledFor {
                authority: self.host_port.clone(),
            });
        }

        Ok(())
    }
}

/// A header or identity stamped onto every outbound request before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RequestModifier {
    /// Add a fixed header to every request.
    AddHeader {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// Stamp the carrier's correlation id into the named header, if present.
    CorrelationIdHeader {
        /// Header name to stamp the correlation id into.
        name: String,
    },
    /// Set the `Content-Type` header.
    ContentType {
        /// MIME type value.
        value: String,
    },
    /// Set a static `Authorization` header.
    Authorization {
        /// Full header value, e.g. `"Bearer ..."`.
        value: String,
    },
}

/// Configuration for event emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObserverConfig {
    /// Suppresses the `request_begin` event entirely.
    #[cfg_attr(feature = "serde", serde(default))]
    pub request_skipped: bool,
    /// Suppresses the `request_end` event entirely.
    #[cfg_attr(feature = "serde", serde(default))]
    pub response_skipped: bool,
    /// Omits request body details from `tracing` emission.
    #[cfg_attr(feature = "serde", serde(default))]
    pub request_body_omitted: bool,
    /// Omits response body details from `tracing` emission.
    #[cfg_attr(feature = "serde", serde(default))]
    pub response_body_omitted: bool,
    /// Header names whose values are redacted before `tracing` emission.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sensitive_header_names: Vec<String>,
}

/// Top-level, validated configuration for a [`crate::Breaker`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakerConfig {
    /// The pool of backend hosts, in rotation order.
    pub hosts: Vec<HostConfig>,
    /// The default per-request deadline, used when a request carries none.
    #[cfg_attr(feature = "serde", serde(with = "humantime_serde"))]
    pub requests_default_ttl: Duration,
    /// Modifiers applied to every outbound request before dispatch.
    #[cfg_attr(feature = "serde", serde(default))]
    pub request_modifiers: Vec<RequestModifier>,
    /// Observability configuration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub observer: ObserverConfig,
}

impl BreakerConfig {
    /// Starts a fluent builder.
    pub fn builder() -> BreakerConfigBuilder {
        BreakerConfigBuilder::default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::EmptyHosts);
        }
        if self.requests_default_ttl.is_zero() {
            return Err(ConfigError::NonPositiveDefaultTtl);
        }
        for host in &self.hosts {
            host.validate()?;
        }
        Ok(())
    }

    /// Parses and validates a configuration from JSON.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, BreakerConfigParseError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from YAML.
    #[cfg(feature = "serde")]
    pub fn from_yaml(yaml: &str) -> Result<Self, BreakerConfigParseError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors raised while parsing a serialized [`BreakerConfig`].
#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
pub enum BreakerConfigParseError {
    /// The document was not valid JSON matching the schema.
    #[error("invalid json configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The document was not valid YAML matching the schema.
    #[error("invalid yaml configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The document parsed but failed validation.
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Fluent builder for [`BreakerConfig`].
///
/// Unlike some builders in this workspace, `build()` never panics: every
/// invalid combination returns a [`ConfigError`] instead.
#[derive(Debug, Default)]
pub struct BreakerConfigBuilder {
    hosts: Vec<HostConfig>,
    requests_default_ttl: Option<Duration>,
    request_modifiers: Vec<RequestModifier>,
    observer: ObserverConfig,
}

impl BreakerConfigBuilder {
    /// Appends a host to the rotation.
    pub fn host(mut self, host: HostConfig) -> Self {
        self.hosts.push(host);
        self
    }

    /// Sets the default per-request deadline.
    pub fn requests_default_ttl(mut self, ttl: Duration) -> Self {
        self.requests_default_ttl = Some(ttl);
        self
    }

    /// Appends a request modifier.
    pub fn request_modifier(mut self, modifier: RequestModifier) -> Self {
        self.request_modifiers.push(modifier);
        self
    }

    /// Sets the observer configuration.
    pub fn observer(mut self, observer: ObserverConfig) -> Self {
        self.observer = observer;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<BreakerConfig, ConfigError> {
        let config = BreakerConfig {
            hosts: self.hosts,
            requests_default_ttl: self
                .requests_default_ttl
                .unwrap_or(Duration::from_secs(1)),
            request_modifiers: self.request_modifiers,
            observer: self.observer,
        };
        config.validate()?;
        Ok(config)
    }
}
