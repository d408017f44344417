//! Layered configuration for a UAM instance.
//!
//! The UAM is embedded inside a host process rather than run as a
//! standalone service, so this is deliberately thinner than a full
//! system/user/local config search: the host owns file discovery and hands
//! this layer either a ready-made [`UamConfig`] or a small TOML fragment it
//! already resolved.
//!
//! Security and transport knobs (credentials, TLS, endpoints) are forwarded
//! through [`crate::rpc::ProxyFactory`] without interpretation and are not
//! modelled here.

use std::time::Duration;

use serde::Deserialize;

use crate::error::UamError;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_ATTEMPT_LAUNCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_QUEUE_NAME: &str = "default";

/// Raw, serde-friendly shape of the TOML fragment a host process may pass
/// to [`UamConfig::from_toml`]. Every field is optional; missing fields
/// fall back to the same defaults as [`UamConfig::default`].
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    poll_interval_ms: Option<u64>,
    attempt_launch_timeout_ms: Option<u64>,
    default_queue_name: Option<String>,
}

/// Resolved configuration for a [`crate::UnmanagedApplicationMaster`].
#[derive(Debug, Clone)]
pub struct UamConfig {
    /// Client-protocol polling cadence used by the Attempt Monitor.
    ///
    /// Note: if this exceeds `attempt_launch_timeout`, the monitor may
    /// observe zero polls before timing out. This is preserved from the
    /// source behaviour rather than clamped; callers that care should keep
    /// `poll_interval < attempt_launch_timeout`.
    pub poll_interval: Duration,
    /// Overall deadline for the attempt to reach LAUNCHED. Defaults to the
    /// source's hard-coded 10s.
    pub attempt_launch_timeout: Duration,
    /// Queue used when the constructor's `queue_name` is blank.
    pub default_queue_name: String,
}

impl Default for UamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            attempt_launch_timeout: Duration::from_millis(DEFAULT_ATTEMPT_LAUNCH_TIMEOUT_MS),
            default_queue_name: DEFAULT_QUEUE_NAME.to_string(),
        }
    }
}

impl UamConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_attempt_launch_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_launch_timeout = timeout;
        self
    }

    pub fn with_default_queue_name(mut self, name: impl Into<String>) -> Self {
        self.default_queue_name = name.into();
        self
    }

    /// Parse a config fragment the host process resolved from its own
    /// config files/environment. Unset fields take the same defaults as
    /// [`UamConfig::default`].
    pub fn from_toml(text: &str) -> Result<Self, UamError> {
        let raw: RawConfig = toml::from_str(text)
            .map_err(|_| UamError::InvalidArgument("malformed UAM config fragment"))?;
        let defaults = Self::default();
        Ok(Self {
            poll_interval: raw
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            attempt_launch_timeout: raw
                .attempt_launch_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.attempt_launch_timeout),
            default_queue_name: raw
                .default_queue_name
                .unwrap_or(defaults.default_queue_name),
        })
    }
}
