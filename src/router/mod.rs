//! # Router Module
//!
//! Resolves incoming requests to exactly one registered route, or to one
//! typed failure, by content negotiation over a published route table.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Scanning the ordered table for routes whose path template matches
//! - Filtering by HTTP verb, `Accept`, and `Content-Type`
//! - Breaking remaining ties toward model-constrained routes
//! - Reporting which stage failed, with enough detail for 404/405/406/415
//!
//! ## Architecture
//!
//! Matching is a five-stage elimination pipeline. Every stage takes the
//! survivors of the previous one and either narrows them or fails the
//! whole resolution with that stage's failure:
//!
//! 1. **Path**: each route's compiled template is tried against the raw
//!    target; matches keep their extracted variables and terminus.
//! 2. **Verb**: survivors are partitioned by HTTP method; the losing
//!    partition's verbs become the 405 `Allow` set.
//! 3. **Response negotiation**: each comma-separated `Accept` fragment is
//!    parsed into a key; a route survives if any key admits its response
//!    format and model.
//! 4. **Request negotiation**: the `Content-Type` header (or its absence)
//!    is parsed into one key matched against request format and model.
//! 5. **Specificity**: a left-to-right refinement prefers routes that
//!    constrain a model axis their competitors leave empty.
//!
//! ## Example
//!
//! ```rust,ignore
//! use typeroute::router::Router;
//! use typeroute::table::RouteTable;
//! use http::Method;
//! use std::sync::Arc;
//!
//! let router = Router::new(Arc::new(table));
//! match router.resolve(&Method::GET, "/api/teams/blue?verbose=1", Some("application/json"), None) {
//!     Ok(matched) => println!("handler: {}", matched.route().handler_id()),
//!     Err(failure) => println!("{}: {}", failure.status(), failure),
//! }
//! ```
//!
//! ## Performance
//!
//! One pass over the table per request, regex-based template matching, and
//! no allocation beyond the candidate lists. Routers are snapshots: they
//! never observe table swaps mid-request.

mod core;

pub use core::{RouteFailure, RouteMatch, Router};
