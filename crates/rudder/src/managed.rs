//! Sentinel-managed connection decorator.
//!
//! Wraps an unmanaged [`Connection`] and resolves the master address before
//! every connect, retrying under the configured deadline. Callers use it
//! exactly like the inner connection; when no master name or no endpoints
//! are configured the wrapper is a pass-through.

use crate::config::SentinelConfig;
use crate::connection::{Connection, DiscoveryConnector};
use crate::endpoint::Endpoint;
use crate::failover::{FailoverController, RetryState};
use crate::resolver::ResolvedMaster;
use crate::{Error, Result};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, warn};

/// A connection whose target is kept pointed at the current master.
pub struct ManagedConnection<C, D: DiscoveryConnector> {
    inner: C,
    config: SentinelConfig,
    failover: Option<FailoverController<D>>,
}

impl<C: Connection, D: DiscoveryConnector> ManagedConnection<C, D> {
    /// Wrap `inner`. Management is active only when the config carries both
    /// a master name and at least one discovery endpoint; otherwise every
    /// call delegates straight to `inner`.
    pub fn new(inner: C, config: SentinelConfig, connector: D) -> Self {
        let failover = config.master_spec().map(|spec| {
            FailoverController::new(
                spec.name,
                config.endpoints.iter().cloned(),
                connector,
                config.master_discovery_attempts,
            )
        });
        Self {
            inner,
            config,
            failover,
        }
    }

    pub fn is_sentinel_managed(&self) -> bool {
        self.failover.is_some()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    /// The failover controller, when management is active. Exposes the
    /// registry for inspection.
    pub fn failover(&self) -> Option<&FailoverController<D>> {
        self.failover.as_ref()
    }

    /// Connect, resolving the master first when managed.
    ///
    /// A refused connect to the freshly resolved master re-enters discovery,
    /// the same as an unreachable discovery endpoint.
    pub async fn connect(&mut self) -> Result<()> {
        if self.failover.is_some() {
            self.run_failover_cycle(true).await
        } else {
            self.inner.connect().await
        }
    }

    /// Resolve the master and rebind the inner connection without
    /// connecting. No-op when management is inactive.
    pub async fn resolve_and_rebind(&mut self) -> Result<()> {
        if self.failover.is_some() {
            self.run_failover_cycle(false).await
        } else {
            Ok(())
        }
    }

    /// Execute a command on the inner connection.
    pub async fn execute(&mut self, cmd: &[&str]) -> Result<Vec<String>> {
        self.inner.execute(cmd).await
    }

    /// One failover cycle: repeat (discover → rebind → optionally connect)
    /// until success, the deadline passes, or a terminal error surfaces.
    /// Each attempt is individually bounded by the configured timeout; an
    /// elapsed bound surfaces as [`Error::Timeout`] and is never retried.
    async fn run_failover_cycle(&mut self, connect_after: bool) -> Result<()> {
        let Self {
            inner,
            config,
            failover,
        } = self;
        let Some(failover) = failover.as_mut() else {
            return Ok(());
        };
        let password = config.master_password.clone();
        let mut retry = RetryState::new(config);

        loop {
            let attempt = async {
                let resolved = failover.discover().await?;
                rebind(inner, &resolved, password.as_deref());
                if connect_after {
                    inner.connect().await?;
                }
                Ok(())
            };

            let outcome: Result<()> = match retry.attempt_timeout() {
                Some(limit) => match timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_) => return Err(Error::Timeout),
                },
                None => attempt.await,
            };

            match outcome {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() => {
                    if retry.deadline_passed() {
                        warn!(
                            "Failover deadline passed after {} retries: {}",
                            retry.attempt_count(),
                            err
                        );
                        return Err(err);
                    }
                    debug!("Master not resolved ({}), retrying failover cycle", err);
                    retry.pause().await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Retarget `conn` at the resolved master. Idempotent: rebinding to the
/// address the connection is already bound to is an observable no-op.
fn rebind<C: Connection>(conn: &mut C, resolved: &ResolvedMaster, password: Option<&str>) {
    if conn.bound_to() == Some(&resolved.address) {
        return;
    }
    debug!("Rebinding connection to master at {}", resolved.address);
    conn.bind(&resolved.address, password);
}

#[async_trait]
impl<C: Connection, D: DiscoveryConnector> Connection for ManagedConnection<C, D> {
    fn bind(&mut self, addr: &Endpoint, password: Option<&str>) {
        self.inner.bind(addr, password);
    }

    fn bound_to(&self) -> Option<&Endpoint> {
        self.inner.bound_to()
    }

    async fn connect(&mut self) -> Result<()> {
        ManagedConnection::connect(self).await
    }

    async fn execute(&mut self, cmd: &[&str]) -> Result<Vec<String>> {
        ManagedConnection::execute(self, cmd).await
    }
}
