//! Call and response shapes handed to the transport.

use crate::params::Params;
use serde_json::Value;
use std::fmt;

/// HTTP verb for one call. Reads carry their parameters as a query string,
/// writes as a form-encoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Authentication attached to a call.
///
/// When a session holds both a bearer token and basic credentials, the
/// token wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Bearer(String),
    Basic { username: String, password: String },
}

/// One fully-built HTTP exchange, ready for a transport to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCall {
    pub method: Method,
    pub url: String,
    pub params: Params,
    pub auth: Option<Auth>,
}

/// A completed HTTP exchange: status code and parsed JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct CmisResponse {
    pub status: u16,
    pub body: Value,
}

impl CmisResponse {
    /// True for any 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
