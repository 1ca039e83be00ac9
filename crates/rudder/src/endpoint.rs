//! Discovery endpoints and their rotation order.

use crate::connection::DiscoveryConnector;
use crate::{Error, Result};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A discovery-service endpoint. Identity is the (host, port) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidReply(format!("not a host:port pair: {s}")))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| Error::InvalidReply(format!("invalid port in endpoint: {s}")))?;
        Ok(Self::new(host, port))
    }
}

/// Ordered discovery endpoints plus a lazy cache of open links.
///
/// The first endpoint is the currently preferred one. Rotation moves the
/// head to the tail and never removes anything: the endpoint count is
/// invariant for the registry's lifetime. Links are opened on first use and
/// reused across discovery passes; a link that failed the network is
/// discarded so the next pass re-dials it.
pub struct EndpointRegistry<D: DiscoveryConnector> {
    endpoints: VecDeque<Endpoint>,
    links: HashMap<Endpoint, D::Link>,
    connector: D,
}

impl<D: DiscoveryConnector> EndpointRegistry<D> {
    pub fn new(endpoints: impl IntoIterator<Item = Endpoint>, connector: D) -> Self {
        Self {
            endpoints: endpoints.into_iter().collect(),
            links: HashMap::new(),
            connector,
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// The currently preferred endpoint, without mutation.
    pub fn current(&self) -> Option<&Endpoint> {
        self.endpoints.front()
    }

    /// Move the preferred endpoint to the back of the order and return the
    /// newly preferred one.
    pub fn rotate(&mut self) -> Option<&Endpoint> {
        if let Some(head) = self.endpoints.pop_front() {
            self.endpoints.push_back(head);
        }
        let next = self.endpoints.front();
        if let Some(next) = next {
            debug!("Trying next discovery endpoint: {}", next);
        }
        next
    }

    /// Cached-or-opened link to the preferred endpoint.
    ///
    /// Opening may dial the network; a failed open is reported as
    /// `Unreachable` and left for the failover loop to handle.
    pub async fn link_for_current(&mut self) -> Result<&mut D::Link> {
        let endpoint = self
            .endpoints
            .front()
            .cloned()
            .ok_or_else(|| Error::Unreachable("no discovery endpoints configured".into()))?;

        match self.links.entry(endpoint) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let link = self.connector.open(entry.key()).await?;
                Ok(entry.insert(link))
            }
        }
    }

    /// Drop the cached link to the preferred endpoint, forcing a re-dial on
    /// next use. The endpoint itself stays in the order.
    pub fn discard_current_link(&mut self) {
        if let Some(endpoint) = self.endpoints.front() {
            self.links.remove(endpoint);
        }
    }

    /// Endpoints in current preference order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}
