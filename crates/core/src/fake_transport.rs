//! Fake transport for testing the session and request layers without a
//! server.
//!
//! # Example
//!
//! ```ignore
//! let (transport, controller) = FakeTransportBuilder::new().build();
//! let session = Session::with_transport("http://cmis.test", Arc::new(transport), SessionConfig::new());
//!
//! controller.script_ok(json!({"ok": true}));
//! let outcome = session.get_repository_info(None).outcome().await;
//!
//! let sent = controller.take_sent();
//! assert_eq!(sent[0].url, "http://cmis.test/repo");
//! ```

use crate::error::{Error, Result};
use crate::transport::Transport;
use cmis_protocol::{CmisResponse, HttpCall};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Builder for creating fake transport instances.
pub struct FakeTransportBuilder {
    // Nothing needed for now, but allows future extensibility
}

impl FakeTransportBuilder {
    pub fn new() -> Self {
        Self {}
    }

    /// Build the fake transport and a controller for scripting replies and
    /// inspecting executed calls.
    pub fn build(self) -> (FakeTransport, FakeTransportController) {
        let state = Arc::new(Mutex::new(FakeState {
            scripted: VecDeque::new(),
            pending: VecDeque::new(),
            sent: Vec::new(),
        }));
        (
            FakeTransport {
                state: Arc::clone(&state),
            },
            FakeTransportController { state },
        )
    }
}

impl Default for FakeTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct FakeState {
    scripted: VecDeque<Result<CmisResponse>>,
    pending: VecDeque<oneshot::Sender<Result<CmisResponse>>>,
    sent: Vec<HttpCall>,
}

/// In-memory [`Transport`] that replays scripted replies.
///
/// Each executed call consumes the next scripted reply if one is queued;
/// otherwise the call parks until the controller completes it.
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl Transport for FakeTransport {
    fn execute(&self, call: HttpCall) -> BoxFuture<'static, Result<CmisResponse>> {
        let receiver = {
            let mut state = self.state.lock();
            state.sent.push(call);
            match state.scripted.pop_front() {
                Some(reply) => return Box::pin(async move { reply }),
                None => {
                    let (tx, rx) = oneshot::channel();
                    state.pending.push_back(tx);
                    rx
                }
            }
        };
        Box::pin(async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(Error::Transport("fake transport dropped".to_string())))
        })
    }
}

/// Controller for scripting replies and inspecting executed calls.
pub struct FakeTransportController {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransportController {
    /// Queues a reply consumed by the next executed call.
    pub fn script(&self, reply: Result<CmisResponse>) {
        self.state.lock().scripted.push_back(reply);
    }

    /// Queues a 200 reply with the given JSON body.
    pub fn script_ok(&self, body: Value) {
        self.script(Ok(CmisResponse { status: 200, body }));
    }

    /// Queues a reply with an arbitrary status.
    pub fn script_status(&self, status: u16, body: Value) {
        self.script(Ok(CmisResponse { status, body }));
    }

    /// Queues a transport-level failure.
    pub fn script_error(&self, message: &str) {
        self.script(Err(Error::Transport(message.to_string())));
    }

    /// Completes the oldest parked call. Returns false if none is parked.
    pub fn complete(&self, reply: Result<CmisResponse>) -> bool {
        let sender = self.state.lock().pending.pop_front();
        match sender {
            Some(sender) => sender.send(reply).is_ok(),
            None => false,
        }
    }

    /// Completes the oldest parked call with a 200 reply.
    pub fn complete_ok(&self, body: Value) -> bool {
        self.complete(Ok(CmisResponse { status: 200, body }))
    }

    /// Number of calls executed so far.
    pub fn sent_count(&self) -> usize {
        self.state.lock().sent.len()
    }

    /// Take all executed calls, clearing the buffer.
    pub fn take_sent(&self) -> Vec<HttpCall> {
        std::mem::take(&mut self.state.lock().sent)
    }
}
