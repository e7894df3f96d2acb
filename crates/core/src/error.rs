//! Error taxonomy for the client.
//!
//! Failures reach callers through a request's error channel or through the
//! `Result` adapters, never as panics. The enum is `Clone` (sources are
//! string-wrapped) so one terminal outcome can reach both an attached
//! handler and an `outcome()` awaiter.

use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Connection, DNS, or body-parse failure before a usable HTTP response
    /// existed.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A 2xx reply whose body does not have the expected shape.
    #[error("unexpected response payload: {0}")]
    Payload(String),

    /// Non-2xx response, produced by the `Result` adapters. The raw response
    /// itself travels the not-ok channel for caller-driven inspection.
    #[error("server returned HTTP {status}")]
    Status { status: u16, body: Value },

    /// A repository-targeting operation was called before discovery selected
    /// a default repository.
    #[error("no default repository selected; call load_repositories first")]
    NoRepository,

    /// `select_repository` was given an id not in the discovered set.
    #[error("unknown repository: {0}")]
    UnknownRepository(String),

    /// The operation exists in the CMIS specification but is not implemented
    /// by this client.
    #[error("operation not implemented: {0}")]
    Unsupported(&'static str),
}

impl Error {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
