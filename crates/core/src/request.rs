//! Pending-exchange values and handler dispatch.
//!
//! Every session operation returns a [`CmisRequest`] whose underlying HTTP
//! call is already in flight. The caller may chain `ok`/`not_ok`/`error` to
//! register continuations, or await [`CmisRequest::outcome`]. The terminal
//! result is buffered: whichever of {transport completion, handler
//! finalization} happens second triggers delivery, so attachment never races
//! completion and exactly one handler fires exactly once.
//!
//! The handler set becomes final when the request handle is dropped or
//! consumed by `outcome()`/`result()`; the usual `session.op(..).ok(..)`
//! chain finalizes at the end of the statement.

use crate::error::{Error, Result};
use cmis_protocol::CmisResponse;
use parking_lot::Mutex;
use std::mem;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Terminal result of one HTTP exchange.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Transport success with a 2xx status.
    Ok(CmisResponse),
    /// Well-formed HTTP response with a non-2xx status.
    NotOk(CmisResponse),
    /// Transport-level failure, or a defined client-side failure.
    Failed(Error),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_not_ok(&self) -> bool {
        matches!(self, Outcome::NotOk(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Collapses the three-way outcome into a `Result`, mapping a non-2xx
    /// response to [`Error::Status`].
    pub fn into_result(self) -> Result<CmisResponse> {
        match self {
            Outcome::Ok(response) => Ok(response),
            Outcome::NotOk(response) => Err(Error::Status {
                status: response.status,
                body: response.body,
            }),
            Outcome::Failed(error) => Err(error),
        }
    }
}

type OkHandler = Box<dyn FnOnce(CmisResponse) + Send>;
type NotOkHandler = Box<dyn FnOnce(CmisResponse) + Send>;
type ErrorHandler = Box<dyn FnOnce(Error) + Send>;

/// Session-wide fallback handlers, used when a request has no explicit
/// handler for the channel that fired. Both default to doing nothing.
#[derive(Clone, Default)]
pub(crate) struct Fallbacks {
    pub(crate) not_ok: Option<Arc<dyn Fn(&CmisResponse) + Send + Sync>>,
    pub(crate) error: Option<Arc<dyn Fn(&Error) + Send + Sync>>,
}

#[derive(Default)]
struct Handlers {
    ok: Option<OkHandler>,
    not_ok: Option<NotOkHandler>,
    error: Option<ErrorHandler>,
}

struct State {
    outcome: Option<Outcome>,
    /// Present once the request handle finalized without the outcome having
    /// arrived yet.
    handlers: Option<Handlers>,
    delivered: bool,
    waiters: Vec<oneshot::Sender<Outcome>>,
}

struct Shared {
    state: Mutex<State>,
    fallbacks: Fallbacks,
}

impl Shared {
    fn new(fallbacks: Fallbacks) -> Self {
        Self {
            state: Mutex::new(State {
                outcome: None,
                handlers: None,
                delivered: false,
                waiters: Vec::new(),
            }),
            fallbacks,
        }
    }

    /// Records the terminal outcome. Dispatches immediately if the handler
    /// set was already finalized; wakes every awaiter either way.
    fn complete(&self, outcome: Outcome) {
        let (to_dispatch, waiters) = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return;
            }
            state.outcome = Some(outcome.clone());
            let waiters = mem::take(&mut state.waiters);
            let handlers = if state.handlers.is_some() && !state.delivered {
                state.delivered = true;
                state.handlers.take()
            } else {
                None
            };
            (handlers, waiters)
        };

        // Handlers run outside the lock: a continuation may itself issue or
        // drop requests.
        if let Some(handlers) = to_dispatch {
            self.dispatch(outcome.clone(), handlers);
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Installs the final handler set. Dispatches immediately if the outcome
    /// already arrived, otherwise stores the handlers for `complete`.
    fn finalize(&self, handlers: Handlers) {
        let ready = {
            let mut state = self.state.lock();
            if state.delivered {
                return;
            }
            match state.outcome.clone() {
                Some(outcome) => {
                    state.delivered = true;
                    Some(outcome)
                }
                None => {
                    state.handlers = Some(handlers);
                    return;
                }
            }
        };
        if let Some(outcome) = ready {
            self.dispatch(outcome, handlers);
        }
    }

    fn dispatch(&self, outcome: Outcome, handlers: Handlers) {
        match outcome {
            Outcome::Ok(response) => {
                if let Some(handler) = handlers.ok {
                    handler(response);
                }
            }
            Outcome::NotOk(response) => match handlers.not_ok {
                Some(handler) => handler(response),
                None => {
                    if let Some(fallback) = &self.fallbacks.not_ok {
                        fallback(&response);
                    }
                }
            },
            Outcome::Failed(error) => match handlers.error {
                Some(handler) => handler(error),
                None => {
                    if let Some(fallback) = &self.fallbacks.error {
                        fallback(&error);
                    }
                }
            },
        }
    }

    async fn wait(&self) -> Outcome {
        let receiver = {
            let mut state = self.state.lock();
            match state.outcome.clone() {
                Some(outcome) => return outcome,
                None => {
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push(tx);
                    rx
                }
            }
        };
        receiver.await.unwrap_or_else(|_| {
            Outcome::Failed(Error::Transport(
                "request dropped before completion".to_string(),
            ))
        })
    }
}

/// Completion side of a pending request, held by the task executing the
/// transport call.
pub(crate) struct Completer {
    shared: Arc<Shared>,
}

impl Completer {
    pub(crate) fn complete(self, outcome: Outcome) {
        self.shared.complete(outcome);
    }
}

/// One outstanding or completed HTTP exchange.
///
/// The underlying call is issued the instant the session operation is
/// invoked, never lazily. Of the three channels, `ok` fires on a 2xx
/// response, `not_ok` on any other well-formed HTTP response, and `error`
/// on transport failure or a defined client-side failure; exactly one fires,
/// exactly once, under any interleaving of attachment and completion.
pub struct CmisRequest {
    shared: Arc<Shared>,
    handlers: Option<Handlers>,
}

impl CmisRequest {
    pub(crate) fn pending(fallbacks: Fallbacks) -> (Self, Completer) {
        let shared = Arc::new(Shared::new(fallbacks));
        let request = Self {
            shared: Arc::clone(&shared),
            handlers: Some(Handlers::default()),
        };
        (request, Completer { shared })
    }

    /// A request that was born already failed, used for defined client-side
    /// failures such as unimplemented operations.
    pub(crate) fn failed(error: Error, fallbacks: Fallbacks) -> Self {
        let (request, completer) = Self::pending(fallbacks);
        completer.complete(Outcome::Failed(error));
        request
    }

    /// Replaces the success handler, invoked with the 2xx response.
    pub fn ok(mut self, handler: impl FnOnce(CmisResponse) + Send + 'static) -> Self {
        if let Some(handlers) = self.handlers.as_mut() {
            handlers.ok = Some(Box::new(handler));
        }
        self
    }

    /// Replaces the non-2xx handler, invoked with the raw response.
    pub fn not_ok(mut self, handler: impl FnOnce(CmisResponse) + Send + 'static) -> Self {
        if let Some(handlers) = self.handlers.as_mut() {
            handlers.not_ok = Some(Box::new(handler));
        }
        self
    }

    /// Replaces the failure handler, invoked with the error.
    pub fn error(mut self, handler: impl FnOnce(Error) + Send + 'static) -> Self {
        if let Some(handlers) = self.handlers.as_mut() {
            handlers.error = Some(Box::new(handler));
        }
        self
    }

    /// Awaits the terminal outcome, firing any attached handlers first.
    pub async fn outcome(mut self) -> Outcome {
        if let Some(handlers) = self.handlers.take() {
            self.shared.finalize(handlers);
        }
        let shared = Arc::clone(&self.shared);
        drop(self);
        shared.wait().await
    }

    /// Awaits the terminal outcome collapsed into a `Result`.
    pub async fn result(self) -> Result<CmisResponse> {
        self.outcome().await.into_result()
    }
}

impl Drop for CmisRequest {
    fn drop(&mut self) {
        if let Some(handlers) = self.handlers.take() {
            self.shared.finalize(handlers);
        }
    }
}
