//! Capability traits at the network seams.
//!
//! The key-value wire protocol is deliberately opaque to this crate: the
//! failover layer only needs to retarget a connection and to issue the two
//! textual `SENTINEL` queries against discovery endpoints. Callers supply
//! implementations backed by whatever client stack they already run.

use crate::endpoint::Endpoint;
use crate::Result;
use async_trait::async_trait;

/// A connection to the key-value store whose target can be replaced in
/// place.
///
/// The binder mutates the target rather than swapping the connection object,
/// so every reference to the same connection observes the rebinding.
#[async_trait]
pub trait Connection: Send {
    /// Replace the connection's target address and credentials. Takes effect
    /// on the next `connect`.
    fn bind(&mut self, addr: &Endpoint, password: Option<&str>);

    /// The currently bound target, if any.
    fn bound_to(&self) -> Option<&Endpoint>;

    /// Establish (or re-establish) the connection to the bound target.
    async fn connect(&mut self) -> Result<()>;

    /// Execute a command against the store, returning the raw array reply.
    async fn execute(&mut self, cmd: &[&str]) -> Result<Vec<String>>;
}

/// An open link to one discovery endpoint, able to answer `SENTINEL`
/// queries with raw textual array replies.
#[async_trait]
pub trait SentinelCommands: Send {
    /// Issue `SENTINEL <args...>`. An empty reply array comes back as an
    /// empty `Vec`; network failures map to [`Error::Unreachable`].
    ///
    /// [`Error::Unreachable`]: crate::Error::Unreachable
    async fn sentinel(&mut self, args: &[&str]) -> Result<Vec<String>>;
}

/// Dials discovery endpoints.
///
/// The registry calls `open` lazily, once per endpoint, and caches the link.
/// A failed open is reported as [`Error::Unreachable`] and retried by the
/// failover loop, never here.
///
/// [`Error::Unreachable`]: crate::Error::Unreachable
#[async_trait]
pub trait DiscoveryConnector: Send + Sync {
    type Link: SentinelCommands;

    async fn open(&self, endpoint: &Endpoint) -> Result<Self::Link>;
}
