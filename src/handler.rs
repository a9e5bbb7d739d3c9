//! The handler seam.
//!
//! A [`Handler`] receives a [`HandlerCall`]: the bound argument list in the
//! order its registration declared, plus direct access to the request and
//! response for slots bound that way. Handlers return their result as a
//! `serde_json::Value` (the success formatter turns it into wire bytes) or
//! a [`HandlerError`] for the error formatter. Any `Fn` with the right
//! shape is a handler, so closures register directly.

use serde_json::Value;

use crate::binder::BoundValue;
use crate::error::HandlerError;
use crate::request::ServerRequest;
use crate::response::ServerResponse;
use crate::route::Route;

/// One handler invocation: bound arguments plus the live exchange.
pub struct HandlerCall<'a> {
    route: &'a Route,
    args: Vec<BoundValue>,
    request: &'a ServerRequest,
    response: &'a mut ServerResponse,
}

impl<'a> HandlerCall<'a> {
    #[must_use]
    pub fn new(
        route: &'a Route,
        args: Vec<BoundValue>,
        request: &'a ServerRequest,
        response: &'a mut ServerResponse,
    ) -> Self {
        Self {
            route,
            args,
            request,
            response,
        }
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        self.route
    }

    /// Bound arguments in declared slot order.
    #[must_use]
    pub fn args(&self) -> &[BoundValue] {
        &self.args
    }

    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&BoundValue> {
        self.args.get(index)
    }

    #[must_use]
    pub fn request(&self) -> &ServerRequest {
        self.request
    }

    /// Mutable response access, for handlers that write headers or take
    /// over the body themselves.
    pub fn response(&mut self) -> &mut ServerResponse {
        self.response
    }
}

/// A registered endpoint implementation.
pub trait Handler: Send + Sync {
    fn invoke(&self, call: &mut HandlerCall<'_>) -> Result<Value, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&mut HandlerCall<'_>) -> Result<Value, HandlerError> + Send + Sync,
{
    fn invoke(&self, call: &mut HandlerCall<'_>) -> Result<Value, HandlerError> {
        self(call)
    }
}
