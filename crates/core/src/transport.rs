//! The HTTP transport collaborator.
//!
//! The session depends only on the narrow [`Transport`] contract: execute
//! one built call, come back with a status and a parsed JSON body, or a
//! transport error. [`ReqwestTransport`] is the default implementation;
//! tests swap in the in-memory fake from [`crate::fake_transport`].

use crate::error::{Error, Result};
use cmis_protocol::{Auth, CmisResponse, HttpCall, Method};
use futures_util::future::BoxFuture;
use serde_json::Value;

/// Executes one HTTP exchange.
///
/// Timeouts, proxies, and connection pooling are the implementation's
/// concern; the client neither exposes nor layers anything on top.
pub trait Transport: Send + Sync {
    fn execute(&self, call: HttpCall) -> BoxFuture<'static, Result<CmisResponse>>;
}

/// Default transport over a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client, e.g. one with a request timeout set.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, call: HttpCall) -> BoxFuture<'static, Result<CmisResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let pairs = call.params.into_pairs();
            let mut builder = match call.method {
                Method::Get => client.get(&call.url).query(&pairs),
                Method::Post => client.post(&call.url).form(&pairs),
            };
            builder = match call.auth {
                Some(Auth::Bearer(token)) => builder.bearer_auth(token),
                Some(Auth::Basic { username, password }) => {
                    builder.basic_auth(username, Some(password))
                }
                None => builder,
            };

            let response = builder
                .send()
                .await
                .map_err(|error| Error::Transport(error.to_string()))?;
            let status = response.status().as_u16();
            let ok = response.status().is_success();
            let text = response
                .text()
                .await
                .map_err(|error| Error::Transport(error.to_string()))?;

            let body = if text.is_empty() {
                Value::Null
            } else {
                match serde_json::from_str(&text) {
                    Ok(value) => value,
                    // A 2xx reply must carry JSON; fault pages on error
                    // statuses are kept verbatim for inspection.
                    Err(error) if ok => {
                        return Err(Error::Transport(format!("invalid JSON body: {error}")));
                    }
                    Err(_) => Value::String(text),
                }
            };

            Ok(CmisResponse { status, body })
        })
    }
}
