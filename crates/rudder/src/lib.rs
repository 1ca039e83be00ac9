//! # Rudder
//!
//! Sentinel-backed master resolution and failover for key-value store
//! clients.
//!
//! Given a logical master name and a list of discovery endpoints, `rudder`
//! finds the network address of the current writable master and keeps an
//! underlying connection pointed at it, transparently re-resolving and
//! reconnecting when the master becomes unreachable or is reported down.
//!
//! # Features
//!
//! - **Endpoint rotation**: unreachable discovery endpoints rotate to the
//!   back of the order, no sleep involved
//! - **Two-step discovery**: resolve the address by name, then confirm the
//!   address is an authoritative live master
//! - **Bounded retry**: an attempt ceiling terminates a discovery pass, a
//!   wall-clock deadline with a wait interval bounds the whole cycle
//! - **Transparent rebinding**: the wrapped connection is retargeted in
//!   place, so every reference to it observes the new master
//!
//! # Example
//!
//! ```rust,ignore
//! use rudder::{Endpoint, ManagedConnection, SentinelConfig};
//! use std::time::Duration;
//!
//! let config = SentinelConfig::builder()
//!     .master_name("mymaster")
//!     .endpoint(Endpoint::new("sentinel-1", 26379))
//!     .endpoint(Endpoint::new("sentinel-2", 26379))
//!     .failover_reconnect_timeout(Duration::from_secs(10))
//!     .build();
//!
//! let mut conn = ManagedConnection::new(raw_connection, config, connector);
//! conn.connect().await?;
//! let reply = conn.execute(&["GET", "key"]).await?;
//! ```
//!
//! The key-value wire protocol stays out of scope: callers implement the
//! [`Connection`] and [`DiscoveryConnector`] capabilities on top of their
//! own client stack.

pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod failover;
pub mod managed;
pub mod resolver;

pub use config::{
    MasterSpec, SentinelConfig, SentinelConfigBuilder, DEFAULT_FAILOVER_RECONNECT_WAIT,
    DEFAULT_MASTER_DISCOVERY_ATTEMPTS,
};
pub use connection::{Connection, DiscoveryConnector, SentinelCommands};
pub use endpoint::{Endpoint, EndpointRegistry};
pub use error::{Error, Result};
pub use failover::{FailoverController, RetryState};
pub use managed::ManagedConnection;
pub use resolver::{MasterResolver, ResolvedMaster};
