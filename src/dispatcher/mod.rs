//! # Dispatcher Module
//!
//! Runs the handler behind a resolved route and turns its outcome into a
//! written response.
//!
//! ## Overview
//!
//! The dispatcher owns the step between route resolution and response
//! bytes. For one matched request it:
//! - Binds the handler's declared parameter slots from the match and the
//!   request (path variables, query parameters, terminus, body)
//! - Invokes the handler under panic protection
//! - Hands the returned value to the route's success handler, or the
//!   returned error to the route's error handler
//!
//! ## Outcomes
//!
//! Dispatch reports a closed tagged result rather than throwing:
//!
//! - `Success { handled }`: the handler returned a value
//! - `Error { handled }`: binding or the handler failed; the error went
//!   through the route's error handler and its declarative status mapping
//! - `InternalFault`: the handler panicked; the only 500-class fault the
//!   dispatcher itself produces
//!
//! Binding failures caused by client input pre-set a client status (400,
//! or 413 for an over-cap body) before the error handler runs, so they are
//! never misreported as server faults.
//!
//! ## Example
//!
//! ```rust,ignore
//! use typeroute::binder::ParameterBinder;
//! use typeroute::dispatcher::Dispatcher;
//!
//! let dispatcher = Dispatcher::new(ParameterBinder::with_defaults());
//! match dispatcher.dispatch(&matched, &mut request, &mut response) {
//!     Ok(outcome) => println!("handled: {}", outcome.handled()),
//!     Err(fault) => println!("fault in {}: {}", fault.handler(), fault.cause()),
//! }
//! ```

mod core;

pub use core::{DispatchOutcome, Dispatcher, InternalFault};
