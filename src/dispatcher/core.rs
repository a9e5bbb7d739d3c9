//! Dispatch of one matched request through binding, the handler, and a
//! response handler.

// Request hot path: keep allocation-heavy string habits out of it.
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::binder::ParameterBinder;
use crate::error::HandlerError;
use crate::handler::HandlerCall;
use crate::request::ServerRequest;
use crate::response::ServerResponse;
use crate::router::RouteMatch;

/// How a dispatched request ended. Closed set: a handler either produced a
/// value or an error, and the selected response handler either wrote the
/// response or reported that it could not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler returned a value; `handled` is the success handler's
    /// verdict.
    Success { handled: bool },
    /// The handler or its binding failed; `handled` is the error handler's
    /// verdict.
    Error { handled: bool },
}

impl DispatchOutcome {
    #[must_use]
    pub fn handled(&self) -> bool {
        match self {
            Self::Success { handled } | Self::Error { handled } => *handled,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A handler panicked. The only server-side dispatch fault; everything else
/// flows through the route's error handler as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalFault {
    handler: String,
    cause: String,
}

impl InternalFault {
    fn new(handler: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            cause: cause.into(),
        }
    }

    #[must_use]
    pub fn handler(&self) -> &str {
        &self.handler
    }

    #[must_use]
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

impl fmt::Display for InternalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler {} panicked: {}", self.handler, self.cause)
    }
}

impl std::error::Error for InternalFault {}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Drives one matched request to a written response.
#[derive(Debug)]
pub struct Dispatcher {
    binder: ParameterBinder,
}

impl Dispatcher {
    #[must_use]
    pub fn new(binder: ParameterBinder) -> Self {
        Self { binder }
    }

    #[must_use]
    pub fn binder(&self) -> &ParameterBinder {
        &self.binder
    }

    /// Bind, invoke, and hand the outcome to the route's response handler.
    ///
    /// Binding failures become structured errors through the route's error
    /// handler, with the response status pre-set to the failure's client
    /// status (400, or 413 for an over-cap body) so the handler's status
    /// mapping is bypassed. Handler panics are caught and surface as
    /// [`InternalFault`], never as an unwound stack.
    pub fn dispatch(
        &self,
        matched: &RouteMatch,
        request: &mut ServerRequest,
        response: &mut ServerResponse,
    ) -> Result<DispatchOutcome, InternalFault> {
        let route = matched.route();

        let args = match self.binder.bind(matched, request) {
            Ok(args) => args,
            Err(bind_err) => {
                if let Some(status) = bind_err.client_status() {
                    response.set_status(status);
                }
                let error = HandlerError::from(bind_err);
                debug!(
                    handler = route.handler_id(),
                    kind = error.kind(),
                    "argument binding failed"
                );
                let handled = route
                    .error_handler()
                    .handle(Some(matched), request, response, &error);
                return Ok(DispatchOutcome::Error { handled });
            }
        };

        let invoked = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut call = HandlerCall::new(route.as_ref(), args, &*request, &mut *response);
            route.handler().invoke(&mut call)
        }));

        match invoked {
            Ok(Ok(value)) => {
                let handled = route
                    .success_handler()
                    .handle(Some(matched), request, response, &value);
                Ok(DispatchOutcome::Success { handled })
            }
            Ok(Err(error)) => {
                debug!(
                    handler = route.handler_id(),
                    kind = error.kind(),
                    "handler reported an error"
                );
                let handled = route
                    .error_handler()
                    .handle(Some(matched), request, response, &error);
                Ok(DispatchOutcome::Error { handled })
            }
            Err(payload) => {
                let cause = panic_message(payload);
                error!(handler = route.handler_id(), cause = %cause, "handler panicked");
                Err(InternalFault::new(route.handler_id(), cause))
            }
        }
    }
}
