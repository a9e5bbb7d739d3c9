//! The service facade tying routing, dispatch, and error rendering together.
//!
//! # Overview
//!
//! [`RouterService`] is the embedding seam. A host server translates its
//! native request into a [`ServerRequest`], calls [`RouterService::handle`],
//! and writes the populated [`ServerResponse`] back out. Every request
//! resolves against a lock-free snapshot of the route table, so a
//! concurrent table swap never tears an in-flight request.
//!
//! # Example
//!
//! ```rust,ignore
//! let table = EndpointResolver::new(handlers, config.clone()).resolve(resources)?;
//! let service = RouterService::with_config(table, config);
//!
//! let mut request = ServerRequest::new(Method::GET, "/teams/BASEBALL/Cubs")
//!     .with_header("Accept", "application/json");
//! let mut response = ServerResponse::new();
//! service.handle(&mut request, &mut response);
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::binder::ParameterBinder;
use crate::body::DeserializerRegistry;
use crate::config::RouterConfig;
use crate::convert::ConverterRegistry;
use crate::dispatcher::{DispatchOutcome, Dispatcher, InternalFault};
use crate::error::HandlerError;
use crate::request::ServerRequest;
use crate::response::ServerResponse;
use crate::response_handlers::{DefaultErrorHandler, ErrorHandler};
use crate::router::{RouteFailure, Router};
use crate::table::{DynamicRouteResolver, RouteTable, SharedRouteTable};

/// Raised by [`RouterService::update_routes`] when no dynamic resolver is
/// configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no dynamic route resolver configured")]
pub struct NoDynamicResolver;

/// What became of one request.
#[derive(Debug)]
pub enum ServeOutcome {
    /// A route matched and its handler ran to completion.
    Dispatched(DispatchOutcome),
    /// No route survived resolution; the failure status and body were
    /// written.
    Rejected(RouteFailure),
    /// The handler panicked; a 500 body was written.
    Faulted(InternalFault),
}

impl ServeOutcome {
    #[must_use]
    pub fn is_error(&self) -> bool {
        match self {
            Self::Dispatched(outcome) => outcome.is_error(),
            Self::Rejected(_) | Self::Faulted(_) => true,
        }
    }
}

/// Routes, dispatches, and renders responses for incoming requests.
pub struct RouterService {
    table: SharedRouteTable,
    dispatcher: Dispatcher,
    default_error: Arc<dyn ErrorHandler>,
    dynamic: Option<Arc<dyn DynamicRouteResolver>>,
    config: RouterConfig,
}

impl RouterService {
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self::with_config(table, RouterConfig::default())
    }

    /// Build a service whose request-body cap follows the configuration.
    #[must_use]
    pub fn with_config(table: RouteTable, config: RouterConfig) -> Self {
        let binder = ParameterBinder::new(
            Arc::new(ConverterRegistry::with_defaults()),
            Arc::new(DeserializerRegistry::with_default_json(
                config.max_body_bytes,
            )),
        );
        Self {
            table: SharedRouteTable::new(table),
            dispatcher: Dispatcher::new(binder),
            default_error: Arc::new(DefaultErrorHandler::new()),
            dynamic: None,
            config,
        }
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Replace the handler that renders bodies for unrouted and faulted
    /// requests.
    #[must_use]
    pub fn with_default_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.default_error = handler;
        self
    }

    #[must_use]
    pub fn with_dynamic_resolver(mut self, resolver: Arc<dyn DynamicRouteResolver>) -> Self {
        self.dynamic = Some(resolver);
        self
    }

    #[must_use]
    pub fn table(&self) -> &SharedRouteTable {
        &self.table
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Serve one request against the current table snapshot.
    pub fn handle(
        &self,
        request: &mut ServerRequest,
        response: &mut ServerResponse,
    ) -> ServeOutcome {
        let router = Router::new(self.table.load());
        let resolved = router.resolve(
            request.method(),
            request.target(),
            request.accept(),
            request.content_type(),
        );
        match resolved {
            Ok(matched) => match self.dispatcher.dispatch(&matched, request, response) {
                Ok(outcome) => ServeOutcome::Dispatched(outcome),
                Err(fault) => {
                    response.set_status(500);
                    let error = HandlerError::from_error("InternalFault", &fault);
                    if !self.default_error.handle(None, request, response, &error) {
                        debug!("fault body could not be written");
                    }
                    ServeOutcome::Faulted(fault)
                }
            },
            Err(failure) => {
                warn!(
                    method = %request.method(),
                    path = request.path(),
                    status = failure.status(),
                    "no route matched"
                );
                self.reject(&failure, request, response);
                ServeOutcome::Rejected(failure)
            }
        }
    }

    fn reject(
        &self,
        failure: &RouteFailure,
        request: &ServerRequest,
        response: &mut ServerResponse,
    ) {
        response.set_status(failure.status());
        if let RouteFailure::MethodNotAllowed { allowed } = failure {
            let joined = allowed
                .iter()
                .map(http::Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            response.set_header("Allow", joined);
        }
        let error = HandlerError::new(failure.kind(), failure.message());
        if !self.default_error.handle(None, request, response, &error) {
            debug!("failure body could not be written");
        }
    }

    /// Ask the configured dynamic resolver to republish the table.
    pub fn update_routes(&self) -> Result<(), NoDynamicResolver> {
        let resolver = self.dynamic.as_ref().ok_or(NoDynamicResolver)?;
        info!("dynamic route update requested");
        let current = self.table.load();
        resolver.update_routes(&self.table, current);
        Ok(())
    }
}

impl fmt::Debug for RouterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterService")
            .field("routes", &self.table.load().len())
            .field("dynamic", &self.dynamic.is_some())
            .field("config", &self.config)
            .finish()
    }
}
