//! Match pipeline over one table snapshot.

// Request hot path: keep allocation-heavy string habits out of it.
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::debug;

use crate::mime::{BodyKey, ResponseKey};
use crate::path::{ParamVec, PathMatch};
use crate::route::{method_cmp, Route};
use crate::table::RouteTable;

/// A winning route plus everything its template extracted from the target.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    route: Arc<Route>,
    variables: ParamVec,
    terminus: String,
}

impl RouteMatch {
    fn new(route: Arc<Route>, hit: PathMatch) -> Self {
        Self {
            route,
            variables: hit.variables,
            terminus: hit.terminus,
        }
    }

    #[inline]
    #[must_use]
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    #[must_use]
    pub fn variables(&self) -> &ParamVec {
        &self.variables
    }

    /// Value of a named path variable, if the template declared one.
    #[inline]
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Unconsumed remainder of the target: the greedy tail for open
    /// templates plus the verbatim `?query` suffix.
    #[must_use]
    pub fn terminus(&self) -> &str {
        &self.terminus
    }
}

/// Why resolution stopped.
///
/// Every variant maps to one client-error status. Server faults are not
/// representable here; matching never runs handler code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteFailure {
    /// No template matched the path.
    NotFound,
    /// Templates matched but none with this verb. `allowed` is the sorted,
    /// deduplicated verb set of the path survivors, ready for an `Allow`
    /// header.
    MethodNotAllowed { allowed: Vec<Method> },
    /// No surviving route produces a representation the `Accept` header
    /// admits.
    NotAcceptable,
    /// No surviving route consumes the declared `Content-Type`.
    UnsupportedMediaType { content_type: Option<String> },
}

impl RouteFailure {
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MethodNotAllowed { .. } => 405,
            Self::NotAcceptable => 406,
            Self::UnsupportedMediaType { .. } => 415,
        }
    }

    /// Stable identifier used as the error kind on the wire.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::MethodNotAllowed { .. } => "MethodNotAllowed",
            Self::NotAcceptable => "NotAcceptable",
            Self::UnsupportedMediaType { .. } => "UnsupportedMediaType",
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NotFound => "no route matches the request path".to_string(),
            Self::MethodNotAllowed { allowed } => {
                let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                format!("method not allowed; allowed methods: {}", allowed.join(", "))
            }
            Self::NotAcceptable => {
                "no route produces a representation acceptable to the request".to_string()
            }
            Self::UnsupportedMediaType {
                content_type: Some(value),
            } => format!("no route consumes content type {value}"),
            Self::UnsupportedMediaType { content_type: None } => {
                "no route consumes the request content type".to_string()
            }
        }
    }
}

impl fmt::Display for RouteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Resolves requests against one table snapshot.
///
/// Resolution runs a fixed stage order (path, verb, response negotiation,
/// request negotiation, specificity), exiting early with the failure of the
/// first stage that eliminates every candidate. A router holds its snapshot
/// for its whole lifetime; a table swap means constructing a new router,
/// which is why construction is a single `Arc` clone.
pub struct Router {
    table: Arc<RouteTable>,
}

impl Router {
    #[must_use]
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Resolve a request to exactly one route or one failure.
    ///
    /// `target` is the raw request target (path plus optional `?query`);
    /// `accept` and `content_type` are raw header values, `None` when the
    /// request carried none.
    pub fn resolve(
        &self,
        method: &Method,
        target: &str,
        accept: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<RouteMatch, RouteFailure> {
        // Stage 1: path. Table order is specificity order; keep it.
        let mut candidates: Vec<(Arc<Route>, PathMatch)> = Vec::new();
        for route in self.table.iter() {
            if let Some(hit) = route.template().match_target(target) {
                candidates.push((Arc::clone(route), hit));
            }
        }
        if candidates.is_empty() {
            debug!(path = target, "no template matched");
            return Err(RouteFailure::NotFound);
        }

        // Stage 2: verb. Non-matching survivors feed the allowed set.
        let mut allowed: Vec<Method> = Vec::new();
        let mut by_method = Vec::with_capacity(candidates.len());
        for (route, hit) in candidates {
            if route.method() == method {
                by_method.push((route, hit));
            } else if !allowed.contains(route.method()) {
                allowed.push(route.method().clone());
            }
        }
        if by_method.is_empty() {
            allowed.sort_by(|a, b| method_cmp(a, b));
            debug!(path = target, verb = %method, ?allowed, "method not allowed");
            return Err(RouteFailure::MethodNotAllowed { allowed });
        }

        // Stage 3: Accept. Any fragment admitting the route keeps it.
        let accept_keys = ResponseKey::split_accept(accept);
        let mut negotiable = Vec::with_capacity(by_method.len());
        for (route, hit) in by_method {
            if accept_keys
                .iter()
                .any(|key| key.matches(route.response_format(), route.response_model()))
            {
                negotiable.push((route, hit));
            }
        }
        if negotiable.is_empty() {
            debug!(
                path = target,
                accept = accept.unwrap_or_default(),
                "no acceptable representation"
            );
            return Err(RouteFailure::NotAcceptable);
        }

        // Stage 4: Content-Type. One key against every survivor.
        let body_key = BodyKey::from_content_type(content_type);
        let mut consumable = Vec::with_capacity(negotiable.len());
        for (route, hit) in negotiable {
            if body_key.matches(route.request_format(), route.request_model()) {
                consumable.push((route, hit));
            }
        }
        if consumable.is_empty() {
            debug!(
                path = target,
                content_type = content_type.unwrap_or_default(),
                "no route consumes the request body"
            );
            return Err(RouteFailure::UnsupportedMediaType {
                content_type: content_type.map(str::to_string),
            });
        }

        // Stage 5: specificity. A left-to-right refinement, not a sort: a
        // challenger wins only by constraining a model axis the current
        // selection leaves empty, and unresolved ties keep the earliest
        // candidate. The incompleteness is intentional; callers depend on
        // this precedence, so it stays exactly this shape.
        let mut winner = 0;
        for index in 1..consumable.len() {
            let best = consumable[winner].0.as_ref();
            let challenger = consumable[index].0.as_ref();
            if !challenger.response_model().is_empty() && best.response_model().is_empty() {
                winner = index;
            } else if !challenger.request_model().is_empty() && best.request_model().is_empty() {
                winner = index;
            }
        }
        let (route, hit) = consumable.swap_remove(winner);
        debug!(path = target, verb = %method, handler = route.handler_id(), "route resolved");
        Ok(RouteMatch::new(route, hit))
    }
}
