//! The discovery pass and the outer retry policy.
//!
//! Two independent bounds protect a failover cycle. The attempt ceiling
//! terminates one discovery pass quickly when endpoints keep refusing
//! (rotation is the recovery action, no sleep involved). The wall-clock
//! deadline with a sleep between passes covers the patient case: the cluster
//! has no confirmed live master yet and a failover is likely in progress
//! elsewhere.

use crate::config::SentinelConfig;
use crate::connection::DiscoveryConnector;
use crate::endpoint::{Endpoint, EndpointRegistry};
use crate::resolver::{MasterResolver, ResolvedMaster};
use crate::{Error, Result};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::warn;

/// Drives the resolver across the endpoint registry for one discovery pass.
pub struct FailoverController<D: DiscoveryConnector> {
    registry: EndpointRegistry<D>,
    resolver: MasterResolver,
    attempts_per_endpoint: u32,
}

impl<D: DiscoveryConnector> FailoverController<D> {
    pub fn new(
        master_name: impl Into<String>,
        endpoints: impl IntoIterator<Item = Endpoint>,
        connector: D,
        attempts_per_endpoint: u32,
    ) -> Self {
        Self {
            registry: EndpointRegistry::new(endpoints, connector),
            resolver: MasterResolver::new(master_name),
            attempts_per_endpoint,
        }
    }

    pub fn registry(&self) -> &EndpointRegistry<D> {
        &self.registry
    }

    pub fn master_name(&self) -> &str {
        self.resolver.master_name()
    }

    /// Run one discovery pass over the registry.
    ///
    /// On `Unreachable` the cached link is discarded and the registry
    /// rotates, immediately trying the next endpoint. The pass is bounded by
    /// `attempts_per_endpoint × endpoint count`; hitting the ceiling means
    /// "no master reachable" and maps to [`Error::MasterUnavailable`], a
    /// circuit breaker against a continuously toggling cluster. All other
    /// resolver outcomes end the pass at once.
    ///
    /// Rotation state survives across passes, so a later pass resumes from
    /// where this one left off.
    pub async fn discover(&mut self) -> Result<ResolvedMaster> {
        let ceiling = self.attempts_per_endpoint as usize * self.registry.len();
        let mut attempts = 0usize;

        loop {
            if attempts >= ceiling {
                warn!(
                    "No reachable master for {} after {} attempts",
                    self.resolver.master_name(),
                    attempts
                );
                return Err(Error::MasterUnavailable(
                    self.resolver.master_name().to_string(),
                ));
            }
            attempts += 1;

            let outcome = match self.registry.link_for_current().await {
                Ok(link) => self.resolver.resolve(link).await,
                Err(err) => Err(err),
            };

            match outcome {
                Ok(resolved) => return Ok(resolved),
                Err(Error::Unreachable(_)) => {
                    self.registry.discard_current_link();
                    self.registry.rotate();
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Retry bookkeeping for one failover cycle. Created fresh per cycle and
/// discarded on resolution or terminal failure.
pub struct RetryState {
    deadline: Instant,
    attempt_timeout: Option<Duration>,
    wait: Duration,
    attempt_count: u32,
}

impl RetryState {
    pub fn new(config: &SentinelConfig) -> Self {
        let timeout = config.failover_reconnect_timeout;
        Self {
            // A zero timeout puts the deadline in the past right away: one
            // best-effort pass, no outer retry.
            deadline: Instant::now() + timeout,
            attempt_timeout: (!timeout.is_zero()).then_some(timeout),
            wait: config.failover_reconnect_wait,
            attempt_count: 0,
        }
    }

    /// Bound for one wrapped discover-and-connect attempt, `None` when the
    /// cycle runs unbounded (zero configured timeout).
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    pub fn deadline_passed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Passes retried so far in this cycle.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Sleep out the wait interval before the next pass.
    pub async fn pause(&mut self) {
        self.attempt_count += 1;
        sleep(self.wait).await;
    }
}
