//! # typeroute
//!
//! **typeroute** is an HTTP request router and content-negotiation pipeline
//! for embedding inside any Rust HTTP server. Routes are identified not just
//! by method and path template but by the request and response formats and
//! models they declare, so several handlers can share one URL and be told
//! apart by the headers on the wire.
//!
//! ## Overview
//!
//! A host server hands each request to a [`service::RouterService`]. The
//! service resolves it through five stages against a lock-free snapshot of
//! the route table, binds the winning route's declared parameters out of the
//! path, query string, and body, invokes the handler, and renders the result
//! (or a structured error body) back onto the response. The table itself is
//! built once from declarative resource definitions and can be atomically
//! swapped at runtime without disturbing in-flight requests.
//!
//! ## Architecture
//!
//! - **[`path`]** - path templates, variable capture, open templates and the
//!   terminus
//! - **[`mime`]** - media-type keys, the `model` parameter, wildcard rules
//! - **[`route`]** / **[`table`]** - route identity and ordering, the
//!   swappable route table
//! - **[`router`]** - five-stage resolution: path, method, Accept,
//!   Content-Type, specificity
//! - **[`resolver`]** - declarative registration producing the table
//! - **[`binder`]** / **[`convert`]** / **[`body`]** - argument binding,
//!   scalar conversion, body decoding
//! - **[`dispatcher`]** - handler invocation with panic isolation
//! - **[`response_handlers`]** / **[`formatter`]** - success and error
//!   rendering
//! - **[`service`]** - the embedding facade
//! - **[`config`]** - environment-driven settings
//! - **[`docs`]** - the machine-readable route catalog
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host server
//!     participant Service as RouterService
//!     participant Router
//!     participant Binder as ParameterBinder
//!     participant Handler
//!     participant Render as Response handlers
//!
//!     Host->>Service: handle(request, response)
//!     Service->>Router: resolve(method, target, Accept, Content-Type)
//!     Router->>Router: match path templates
//!     alt no template matches
//!         Router-->>Host: 404 Not Found
//!     end
//!     Router->>Router: filter by method
//!     alt path matches only under other methods
//!         Router-->>Host: 405 + Allow header
//!     end
//!     Router->>Router: negotiate Accept, then Content-Type
//!     alt no producer / no consumer
//!         Router-->>Host: 406 / 415
//!     end
//!     Router-->>Service: RouteMatch (most specific survivor)
//!     Service->>Binder: bind declared slots
//!     alt conversion or body failure
//!         Binder-->>Render: 400 / 413 error body
//!     end
//!     Binder-->>Service: argument list
//!     Service->>Handler: invoke(call)
//!     alt handler reports an error
//!         Handler-->>Render: mapped status + error body
//!     end
//!     Handler-->>Render: JSON value
//!     Render-->>Host: formatted response
//! ```
//!
//! ### Key Architectural Patterns
//!
//! 1. **Header-qualified routing**: format and model constraints are part of
//!    a route's identity, not an afterthought
//! 2. **Stage-ordered failure**: each resolution stage owns one status code,
//!    so a failed request always says which contract it broke
//! 3. **Snapshot routing**: requests resolve against an immutable table
//!    snapshot; publication is a single atomic swap
//! 4. **Declarative binding**: handlers state their parameter slots once at
//!    registration and receive converted arguments in order
//! 5. **Handlers return values, not responses**: rendering is the response
//!    handlers' job, and error bodies share one wire shape everywhere
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use http::Method;
//! use serde_json::json;
//! use typeroute::{
//!     EndpointDef, EndpointResolver, HandlerBinding, HandlerCall, ParamSlot, ResourceDef,
//!     ResponseHandlerRegistry, RouterConfig, RouterService, ServerRequest, ServerResponse,
//! };
//!
//! // Declare a resource and its endpoints.
//! let teams = ResourceDef::new("/teams")
//!     .with_response_model("urn:example:team")
//!     .with_endpoint(
//!         EndpointDef::new(
//!             Method::GET,
//!             "/{type}/{name}",
//!             "teams.get",
//!             Arc::new(|call: &mut HandlerCall<'_>| {
//!                 let name = call.arg(1).and_then(|arg| arg.as_value()).cloned();
//!                 Ok(json!({ "type": "BASEBALL", "name": name }))
//!             }),
//!         )
//!         .with_binding(HandlerBinding::new(vec![
//!             ParamSlot::path("type", "string"),
//!             ParamSlot::path("name", "string"),
//!         ])),
//!     );
//!
//! // Build the table and the service.
//! let config = RouterConfig::default();
//! let handlers = ResponseHandlerRegistry::with_json_defaults();
//! let table = EndpointResolver::new(handlers, config.clone())
//!     .resolve(vec![teams])
//!     .expect("valid registration");
//! let service = RouterService::with_config(table, config);
//!
//! // A host server translates its native request, calls handle, and writes
//! // the populated response back out.
//! let mut request = ServerRequest::new(Method::GET, "/teams/BASEBALL/Cubs")
//!     .with_header("Accept", "application/json");
//! let mut response = ServerResponse::new();
//! service.handle(&mut request, &mut response);
//! assert_eq!(response.status(), 200);
//! ```
//!
//! ## Negotiation Headers
//!
//! Clients qualify a media type with the `model` parameter to pick between
//! routes sharing a path:
//!
//! ```text
//! GET /teams/all HTTP/1.1
//! Accept: application/json; model=urn:example:teamlist
//! ```
//!
//! A route producing `(application/json, urn:example:teamlist)` beats one
//! producing plain `application/json` for that request. `*/*` and an absent
//! `Accept` header match any producer.
//!
//! ## Error Bodies
//!
//! Failures render a single JSON shape, whether they come from routing,
//! binding, or the handler:
//!
//! ```json
//! {
//!   "error_type": "FieldValidation",
//!   "error_code": "BAD_INPUT_IN_REQUEST",
//!   "error_messages": ["name must not be empty"],
//!   "implicated_fields": ["name"]
//! }
//! ```

pub mod binder;
pub mod body;
pub mod config;
pub mod convert;
pub mod dispatcher;
pub mod docs;
pub mod error;
pub mod formatter;
pub mod handler;
pub mod mime;
pub mod path;
pub mod request;
pub mod resolver;
pub mod response;
pub mod response_handlers;
pub mod route;
pub mod router;
pub mod service;
pub mod table;

pub use binder::{BoundValue, HandlerBinding, ParamSlot, ParameterBinder};
pub use config::RouterConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher, InternalFault};
pub use error::{BindError, HandlerError, RegistrationError, ERROR_CODE_BAD_INPUT};
pub use handler::{Handler, HandlerCall};
pub use request::ServerRequest;
pub use resolver::{EndpointDef, EndpointResolver, ResourceDef};
pub use response::ServerResponse;
pub use response_handlers::{
    DefaultErrorHandler, DefaultSuccessHandler, ErrorHandler, ResponseHandlerRegistry, ReturnKey,
    SuccessHandler,
};
pub use route::{ErrorStatus, Route, RouteParts};
pub use router::{RouteFailure, RouteMatch, Router};
pub use service::{NoDynamicResolver, RouterService, ServeOutcome};
pub use table::{DynamicRouteResolver, RouteTable, SharedRouteTable};
