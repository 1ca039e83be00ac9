//! Failover configuration.

use crate::endpoint::Endpoint;
use std::time::Duration;

/// Pause between failover passes once a full discovery pass has failed.
pub const DEFAULT_FAILOVER_RECONNECT_WAIT: Duration = Duration::from_millis(100);

/// Per-endpoint attempt multiplier for one discovery pass.
pub const DEFAULT_MASTER_DISCOVERY_ATTEMPTS: u32 = 2;

/// Configuration for sentinel-managed connections.
///
/// Supplied once at construction; only presence is validated here, the
/// values themselves come from an external configuration collaborator.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// Logical name of the master to resolve.
    pub master_name: Option<String>,
    /// Password applied to the connection on every rebind.
    pub master_password: Option<String>,
    /// Discovery endpoints in preference order.
    pub endpoints: Vec<Endpoint>,
    /// Wall-clock budget for one failover cycle. Zero means a single
    /// best-effort pass with no deadline.
    pub failover_reconnect_timeout: Duration,
    /// Sleep between failover passes.
    pub failover_reconnect_wait: Duration,
    /// Attempt ceiling per pass is this value times the endpoint count.
    pub master_discovery_attempts: u32,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            master_name: None,
            master_password: None,
            endpoints: Vec::new(),
            failover_reconnect_timeout: Duration::ZERO,
            failover_reconnect_wait: DEFAULT_FAILOVER_RECONNECT_WAIT,
            master_discovery_attempts: DEFAULT_MASTER_DISCOVERY_ATTEMPTS,
        }
    }
}

impl SentinelConfig {
    pub fn builder() -> SentinelConfigBuilder {
        SentinelConfigBuilder::default()
    }

    /// Whether sentinel management is active: both a master name and at
    /// least one discovery endpoint are configured. When false the managed
    /// connection behaves as a direct, unmanaged client.
    pub fn is_sentinel_managed(&self) -> bool {
        self.master_name.is_some() && !self.endpoints.is_empty()
    }

    /// The immutable master spec consumed by the failover controller, or
    /// `None` when management is inactive.
    pub fn master_spec(&self) -> Option<MasterSpec> {
        if !self.is_sentinel_managed() {
            return None;
        }
        self.master_name.as_ref().map(|name| MasterSpec {
            name: name.clone(),
            password: self.master_password.clone(),
        })
    }
}

/// Builder for [`SentinelConfig`].
#[derive(Default)]
pub struct SentinelConfigBuilder {
    config: SentinelConfig,
}

impl SentinelConfigBuilder {
    /// Set the logical master name.
    pub fn master_name(mut self, name: impl Into<String>) -> Self {
        self.config.master_name = Some(name.into());
        self
    }

    /// Set the master password.
    pub fn master_password(mut self, password: impl Into<String>) -> Self {
        self.config.master_password = Some(password.into());
        self
    }

    /// Set the discovery endpoints, in preference order.
    pub fn endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    /// Add a single discovery endpoint at the back of the order.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.config.endpoints.push(endpoint);
        self
    }

    /// Set the failover cycle deadline.
    pub fn failover_reconnect_timeout(mut self, timeout: Duration) -> Self {
        self.config.failover_reconnect_timeout = timeout;
        self
    }

    /// Set the pause between failover passes.
    pub fn failover_reconnect_wait(mut self, wait: Duration) -> Self {
        self.config.failover_reconnect_wait = wait;
        self
    }

    /// Set the per-endpoint attempt multiplier.
    pub fn master_discovery_attempts(mut self, attempts: u32) -> Self {
        self.config.master_discovery_attempts = attempts;
        self
    }

    pub fn build(self) -> SentinelConfig {
        self.config
    }
}

/// Name and credentials of the master being resolved. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSpec {
    pub name: String,
    pub password: Option<String>,
}
