//! One discovery round against a single discovery endpoint.

use crate::connection::SentinelCommands;
use crate::endpoint::Endpoint;
use crate::{Error, Result};
use tracing::debug;

/// Result of one successful discovery round. Consumed immediately by the
/// binder, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMaster {
    pub address: Endpoint,
    pub confirmed_live: bool,
}

/// Executes the two-step discovery protocol against one endpoint's link:
/// resolve the master address by name, then confirm the address is an
/// authoritative live master.
pub struct MasterResolver {
    name: String,
}

impl MasterResolver {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn master_name(&self) -> &str {
        &self.name
    }

    /// Run one discovery round.
    ///
    /// Outcomes:
    /// - empty address reply → [`Error::NoMaster`], a configuration problem
    ///   the caller must not retry;
    /// - network failure on either step → [`Error::Unreachable`], the caller
    ///   rotates to the next endpoint;
    /// - address reported down or with an unknown run id →
    ///   [`Error::MasterUnavailable`], retryable after a wait;
    /// - otherwise a live [`ResolvedMaster`].
    pub async fn resolve<L: SentinelCommands>(&self, link: &mut L) -> Result<ResolvedMaster> {
        let reply = link
            .sentinel(&["get-master-addr-by-name", &self.name])
            .await?;
        if reply.is_empty() {
            return Err(Error::NoMaster(self.name.clone()));
        }
        let address = parse_master_addr(&reply)?;

        let port = address.port.to_string();
        let reply = link
            .sentinel(&["is-master-down-by-addr", &address.host, &port])
            .await?;
        let (down_flag, run_id) = parse_down_reply(&reply)?;

        if down_flag == "1" || run_id == "?" {
            return Err(Error::MasterUnavailable(self.name.clone()));
        }

        debug!("Resolved master {} at {}", self.name, address);
        Ok(ResolvedMaster {
            address,
            confirmed_live: true,
        })
    }
}

fn parse_master_addr(reply: &[String]) -> Result<Endpoint> {
    match reply {
        [host, port] => {
            let port = port.parse::<u16>().map_err(|_| {
                Error::InvalidReply(format!("master address port is not numeric: {port}"))
            })?;
            Ok(Endpoint::new(host.clone(), port))
        }
        _ => Err(Error::InvalidReply(format!(
            "get-master-addr-by-name returned {} elements, expected 2",
            reply.len()
        ))),
    }
}

fn parse_down_reply(reply: &[String]) -> Result<(&str, &str)> {
    match reply {
        [down_flag, run_id] => Ok((down_flag, run_id)),
        _ => Err(Error::InvalidReply(format!(
            "is-master-down-by-addr returned {} elements, expected 2",
            reply.len()
        ))),
    }
}
