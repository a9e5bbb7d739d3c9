//! One registered endpoint and its position in the table.
//!
//! A [`Route`] is identified by six axes: path template, method, and the
//! four content-negotiation strings (request/response format and model).
//! Ordering over those axes decides which routes the pipeline tries first:
//! templates by specificity, then method rank, then the negotiation strings
//! with empty (unconstrained) values sorting last so the most general route
//! is always the final fallback. Everything else a route carries (handler,
//! binding plan, response handlers, error-status mappings) was selected at
//! registration time and never affects matching.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::binder::HandlerBinding;
use crate::error::RegistrationError;
use crate::handler::Handler;
use crate::mime::WILDCARD;
use crate::path::PathTemplate;
use crate::response_handlers::{ErrorHandler, SuccessHandler};

/// Well-known verbs rank in definition order; anything else (an extension
/// method) ranks after all of them.
fn method_rank(method: &Method) -> u8 {
    match method.as_str() {
        "GET" => 0,
        "HEAD" => 1,
        "POST" => 2,
        "PUT" => 3,
        "DELETE" => 4,
        "OPTIONS" => 5,
        "TRACE" => 6,
        "PATCH" => 7,
        _ => 8,
    }
}

/// Method order: rank first, extension methods tie-break by name.
pub(crate) fn method_cmp(a: &Method, b: &Method) -> Ordering {
    method_rank(a)
        .cmp(&method_rank(b))
        .then_with(|| a.as_str().cmp(b.as_str()))
}

/// Case-insensitive order with absent/empty sorting last, so a route with
/// no constraint on an axis is tried after every constrained sibling.
fn constraint_cmp(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a
            .bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase())),
    }
}

/// A declarative mapping from an error kind to the response status (and
/// optionally a wire error code) the default error handler should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorStatus {
    pub kind: String,
    pub status: u16,
    pub code: Option<String>,
}

impl ErrorStatus {
    #[must_use]
    pub fn new(kind: impl Into<String>, status: u16) -> Self {
        Self {
            kind: kind.into(),
            status,
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Everything needed to assemble a [`Route`]. Built by the endpoint
/// resolver; public so tests and custom registration layers can construct
/// routes directly.
pub struct RouteParts {
    pub method: Method,
    pub template: PathTemplate,
    pub request_format: String,
    pub request_model: String,
    pub response_format: String,
    pub response_model: String,
    pub handler_id: String,
    pub handler: Arc<dyn Handler>,
    pub binding: HandlerBinding,
    pub success_handler: Arc<dyn SuccessHandler>,
    pub error_handler: Arc<dyn ErrorHandler>,
    pub error_statuses: Vec<ErrorStatus>,
    pub dynamic: bool,
}

/// One registered endpoint.
pub struct Route {
    method: Method,
    template: PathTemplate,
    request_format: String,
    request_model: String,
    response_format: String,
    response_model: String,
    handler_id: String,
    handler: Arc<dyn Handler>,
    binding: HandlerBinding,
    success_handler: Arc<dyn SuccessHandler>,
    error_handler: Arc<dyn ErrorHandler>,
    error_statuses: Vec<ErrorStatus>,
    dynamic: bool,
}

impl Route {
    /// Validate and assemble a route.
    ///
    /// A route may *consume* `*/*` (accept any declared Content-Type) but
    /// never produce it; a wildcard response format is rejected here.
    pub fn from_parts(parts: RouteParts) -> Result<Self, RegistrationError> {
        if parts.response_format == WILDCARD {
            return Err(RegistrationError::WildcardResponseFormat {
                method: parts.method.to_string(),
                pattern: parts.template.pattern().to_string(),
            });
        }
        Ok(Self {
            method: parts.method,
            template: parts.template,
            request_format: parts.request_format,
            request_model: parts.request_model,
            response_format: parts.response_format,
            response_model: parts.response_model,
            handler_id: parts.handler_id,
            handler: parts.handler,
            binding: parts.binding,
            success_handler: parts.success_handler,
            error_handler: parts.error_handler,
            error_statuses: parts.error_statuses,
            dynamic: parts.dynamic,
        })
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    #[inline]
    #[must_use]
    pub fn request_format(&self) -> &str {
        &self.request_format
    }

    #[inline]
    #[must_use]
    pub fn request_model(&self) -> &str {
        &self.request_model
    }

    #[inline]
    #[must_use]
    pub fn response_format(&self) -> &str {
        &self.response_format
    }

    #[inline]
    #[must_use]
    pub fn response_model(&self) -> &str {
        &self.response_model
    }

    #[must_use]
    pub fn handler_id(&self) -> &str {
        &self.handler_id
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    #[must_use]
    pub fn binding(&self) -> &HandlerBinding {
        &self.binding
    }

    #[must_use]
    pub fn success_handler(&self) -> &Arc<dyn SuccessHandler> {
        &self.success_handler
    }

    #[must_use]
    pub fn error_handler(&self) -> &Arc<dyn ErrorHandler> {
        &self.error_handler
    }

    /// First declared status mapping for an error kind, if any.
    #[must_use]
    pub fn error_status_for(&self, kind: &str) -> Option<&ErrorStatus> {
        self.error_statuses.iter().find(|e| e.kind == kind)
    }

    /// Whether a dynamic resolver registered this route.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template.pattern())
            .field("request_format", &self.request_format)
            .field("request_model", &self.request_model)
            .field("response_format", &self.response_format)
            .field("response_model", &self.response_model)
            .field("handler_id", &self.handler_id)
            .field("dynamic", &self.dynamic)
            .finish()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.method,
            self.template.pattern(),
            self.handler_id
        )
    }
}

impl PartialEq for Route {
    /// Identity is the six matching axes; handler wiring never participates.
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Route {}

impl PartialOrd for Route {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Route {
    fn cmp(&self, other: &Self) -> Ordering {
        self.template
            .cmp(&other.template)
            .then_with(|| method_cmp(&self.method, &other.method))
            .then_with(|| constraint_cmp(&self.response_model, &other.response_model))
            .then_with(|| constraint_cmp(&self.request_model, &other.request_model))
            .then_with(|| constraint_cmp(&self.response_format, &other.response_format))
            .then_with(|| constraint_cmp(&self.request_format, &other.request_format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::request::ServerRequest;
    use crate::response::ServerResponse;
    use crate::router::RouteMatch;
    use serde_json::Value;

    struct Writes;

    impl SuccessHandler for Writes {
        fn handle(
            &self,
            _matched: Option<&RouteMatch>,
            _request: &ServerRequest,
            _response: &mut ServerResponse,
            _value: &Value,
        ) -> bool {
            true
        }
    }

    impl ErrorHandler for Writes {
        fn handle(
            &self,
            _matched: Option<&RouteMatch>,
            _request: &ServerRequest,
            _response: &mut ServerResponse,
            _error: &HandlerError,
        ) -> bool {
            true
        }
    }

    fn route(
        method: Method,
        pattern: &str,
        consumes: (&str, &str),
        produces: (&str, &str),
    ) -> Route {
        Route::from_parts(RouteParts {
            method,
            template: PathTemplate::parse("", pattern).unwrap(),
            request_format: consumes.0.to_string(),
            request_model: consumes.1.to_string(),
            response_format: produces.0.to_string(),
            response_model: produces.1.to_string(),
            handler_id: "test".to_string(),
            handler: Arc::new(|_: &mut crate::handler::HandlerCall<'_>| Ok(Value::Null)),
            binding: HandlerBinding::empty(),
            success_handler: Arc::new(Writes),
            error_handler: Arc::new(Writes),
            error_statuses: Vec::new(),
            dynamic: false,
        })
        .unwrap()
    }

    const JSON: &str = "application/json";

    #[test]
    fn wildcard_response_format_is_rejected() {
        let err = Route::from_parts(RouteParts {
            method: Method::GET,
            template: PathTemplate::parse("", "/x").unwrap(),
            request_format: String::new(),
            request_model: String::new(),
            response_format: WILDCARD.to_string(),
            response_model: String::new(),
            handler_id: "bad".to_string(),
            handler: Arc::new(|_: &mut crate::handler::HandlerCall<'_>| Ok(Value::Null)),
            binding: HandlerBinding::empty(),
            success_handler: Arc::new(Writes),
            error_handler: Arc::new(Writes),
            error_statuses: Vec::new(),
            dynamic: false,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::WildcardResponseFormat { .. }
        ));
    }

    #[test]
    fn template_outranks_method() {
        let specific = route(Method::PUT, "/teams/all", ("", ""), (JSON, ""));
        let general = route(Method::GET, "/teams/{name}", ("", ""), (JSON, ""));
        assert!(specific < general);
    }

    #[test]
    fn methods_order_by_rank_then_extensions_by_name() {
        let get = route(Method::GET, "/t", ("", ""), (JSON, ""));
        let put = route(Method::PUT, "/t", ("", ""), (JSON, ""));
        assert!(get < put);

        let purge = route(
            Method::from_bytes(b"PURGE").unwrap(),
            "/t",
            ("", ""),
            (JSON, ""),
        );
        let brew = route(
            Method::from_bytes(b"BREW").unwrap(),
            "/t",
            ("", ""),
            (JSON, ""),
        );
        assert!(put < purge);
        assert!(brew < purge);
    }

    #[test]
    fn constrained_model_sorts_before_unconstrained() {
        let with_model = route(Method::GET, "/t", ("", ""), (JSON, "urn:x:team"));
        let without = route(Method::GET, "/t", ("", ""), (JSON, ""));
        assert!(with_model < without);
    }

    #[test]
    fn model_comparison_is_case_insensitive() {
        let a = route(Method::GET, "/t", ("", ""), (JSON, "Team"));
        let b = route(Method::GET, "/t", ("", ""), (JSON, "team"));
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a, b);
    }

    #[test]
    fn identical_axes_compare_equal_regardless_of_handler() {
        let a = route(Method::GET, "/t/{x}", (JSON, "In"), (JSON, "Out"));
        let b = route(Method::GET, "/t/{y}", (JSON, "In"), (JSON, "Out"));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_routes_never_compare_equal() {
        let a = route(Method::GET, "/t", ("", ""), (JSON, "Team"));
        let b = route(Method::GET, "/t", ("", ""), (JSON, ""));
        let c = route(Method::GET, "/t", (JSON, ""), (JSON, ""));
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_ne!(b.cmp(&c), Ordering::Equal);
        assert_ne!(a.cmp(&c), Ordering::Equal);
    }

    #[test]
    fn error_status_lookup_is_exact_first_match() {
        let mut parts = RouteParts {
            method: Method::GET,
            template: PathTemplate::parse("", "/x").unwrap(),
            request_format: String::new(),
            request_model: String::new(),
            response_format: JSON.to_string(),
            response_model: String::new(),
            handler_id: "x".to_string(),
            handler: Arc::new(|_: &mut crate::handler::HandlerCall<'_>| Ok(Value::Null)),
            binding: HandlerBinding::empty(),
            success_handler: Arc::new(Writes),
            error_handler: Arc::new(Writes),
            error_statuses: vec![
                ErrorStatus::new("RosterFull", 409).with_code("ROSTER_FULL"),
                ErrorStatus::new("RosterFull", 400),
            ],
            dynamic: false,
        };
        parts.error_statuses.push(ErrorStatus::new("Other", 422));
        let route = Route::from_parts(parts).unwrap();
        let found = route.error_status_for("RosterFull").unwrap();
        assert_eq!(found.status, 409);
        assert_eq!(found.code.as_deref(), Some("ROSTER_FULL"));
        assert!(route.error_status_for("Unknown").is_none());
    }
}
