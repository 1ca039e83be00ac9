use thiserror::Error;

/// Errors surfaced by master resolution and failover.
///
/// Only terminal outcomes cross the component boundary; retryable kinds are
/// handled inside the failover loop and escape only once the deadline has
/// passed.
#[derive(Error, Debug)]
pub enum Error {
    /// The discovery endpoint explicitly reports no master under this name.
    /// A configuration problem, never retried.
    #[error("No master named: {0}")]
    NoMaster(String),

    /// Discovery succeeded but the reported address is not a live master.
    #[error("The master: {0} is currently not available")]
    MasterUnavailable(String),

    /// A discovery endpoint or the resolved master refused or failed the
    /// network connection.
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// The failover deadline elapsed while blocked on network I/O.
    #[error("Timeout connecting to discovery endpoints")]
    Timeout,

    /// A discovery endpoint returned a reply this layer cannot interpret.
    #[error("Invalid discovery reply: {0}")]
    InvalidReply(String),
}

impl Error {
    /// Whether the failover loop may retry after this error.
    ///
    /// `Unreachable` is recovered by rotating to the next endpoint;
    /// `MasterUnavailable` by waiting out an in-progress failover. Everything
    /// else is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Unreachable(_) | Error::MasterUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
