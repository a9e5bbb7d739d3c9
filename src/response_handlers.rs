//! Response handlers: how a handler outcome becomes response bytes.
//!
//! Handlers are selected at registration time by [`ReturnKey`], the
//! `(response_model, response_format)` pair a route declares, never during
//! matching, so the registry can stay a flat map. The defaults write JSON:
//! success values through the JSON formatter, errors as a structured body
//! with the causal message chain and any declared status mapping applied.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::HandlerError;
use crate::formatter::{JsonFormatter, ResponseFormatter};
use crate::request::ServerRequest;
use crate::response::ServerResponse;
use crate::router::RouteMatch;

/// Lookup key for response handlers: model first, format second.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReturnKey {
    model: String,
    format: String,
}

impl ReturnKey {
    #[must_use]
    pub fn new(model: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            format: format.into(),
        }
    }

    /// The registry-wide fallback key.
    #[must_use]
    pub fn json_default() -> Self {
        Self::new("", "application/json")
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }
}

impl fmt::Display for ReturnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.model, self.format)
    }
}

/// Writes a handler's success value to the response. Returns whether the
/// response was handled.
pub trait SuccessHandler: Send + Sync {
    fn handle(
        &self,
        matched: Option<&RouteMatch>,
        request: &ServerRequest,
        response: &mut ServerResponse,
        value: &Value,
    ) -> bool;
}

/// Writes a handler's error to the response. Returns whether the response
/// was handled.
pub trait ErrorHandler: Send + Sync {
    fn handle(
        &self,
        matched: Option<&RouteMatch>,
        request: &ServerRequest,
        response: &mut ServerResponse,
        error: &HandlerError,
    ) -> bool;
}

/// Default success handler: formats the value and sets `Content-Type`,
/// leaving the status alone. A `null` value writes no body.
pub struct DefaultSuccessHandler {
    formatter: Arc<dyn ResponseFormatter>,
}

impl DefaultSuccessHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_formatter(Arc::new(JsonFormatter))
    }

    #[must_use]
    pub fn with_formatter(formatter: Arc<dyn ResponseFormatter>) -> Self {
        Self { formatter }
    }
}

impl Default for DefaultSuccessHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SuccessHandler for DefaultSuccessHandler {
    fn handle(
        &self,
        _matched: Option<&RouteMatch>,
        _request: &ServerRequest,
        response: &mut ServerResponse,
        value: &Value,
    ) -> bool {
        if value.is_null() {
            return true;
        }
        match self.formatter.format(value) {
            Ok(bytes) => {
                response.set_header("Content-Type", self.formatter.content_type());
                response.set_body(bytes);
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to format success response");
                response.set_status(500);
                true
            }
        }
    }
}

/// The structured error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    error_messages: Vec<String>,
    implicated_fields: Vec<String>,
}

/// Default error handler.
///
/// If the response status is still below 400 the route's declarative
/// error-kind mapping decides the status (500 when no mapping matches); a
/// status already at 400 or above was set upstream and is kept. A matching
/// mapping may also override the error code.
pub struct DefaultErrorHandler {
    formatter: Arc<dyn ResponseFormatter>,
}

impl DefaultErrorHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_formatter(Arc::new(JsonFormatter))
    }

    #[must_use]
    pub fn with_formatter(formatter: Arc<dyn ResponseFormatter>) -> Self {
        Self { formatter }
    }
}

impl Default for DefaultErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorHandler for DefaultErrorHandler {
    fn handle(
        &self,
        matched: Option<&RouteMatch>,
        _request: &ServerRequest,
        response: &mut ServerResponse,
        error: &HandlerError,
    ) -> bool {
        let mut code = error.code().map(str::to_string);
        if response.status() < 400 {
            match matched.and_then(|m| m.route().error_status_for(error.kind())) {
                Some(mapping) => {
                    response.set_status(mapping.status);
                    if let Some(mapped) = &mapping.code {
                        code = Some(mapped.clone());
                    }
                }
                None => response.set_status(500),
            }
        }
        let body = ErrorBody {
            error_type: error.kind().to_string(),
            error_code: code,
            error_messages: error.messages().to_vec(),
            implicated_fields: error.fields().to_vec(),
        };
        let written = serde_json::to_value(&body)
            .map_err(crate::error::FormatterError::from)
            .and_then(|value| self.formatter.format(&value));
        match written {
            Ok(bytes) => {
                response.set_header("Content-Type", self.formatter.content_type());
                response.set_body(bytes);
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to format error response");
                false
            }
        }
    }
}

/// Flat handler maps consulted once per route at registration.
pub struct ResponseHandlerRegistry {
    success: HashMap<ReturnKey, Arc<dyn SuccessHandler>>,
    error: HashMap<ReturnKey, Arc<dyn ErrorHandler>>,
}

impl ResponseHandlerRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            success: HashMap::new(),
            error: HashMap::new(),
        }
    }

    /// Registry with the JSON defaults under [`ReturnKey::json_default`].
    #[must_use]
    pub fn with_json_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_success(ReturnKey::json_default(), Arc::new(DefaultSuccessHandler::new()));
        registry.register_error(ReturnKey::json_default(), Arc::new(DefaultErrorHandler::new()));
        registry
    }

    pub fn register_success(&mut self, key: ReturnKey, handler: Arc<dyn SuccessHandler>) {
        self.success.insert(key, handler);
    }

    pub fn register_error(&mut self, key: ReturnKey, handler: Arc<dyn ErrorHandler>) {
        self.error.insert(key, handler);
    }

    /// Exact entry for the key, else the default key's entry.
    #[must_use]
    pub fn success_for(&self, key: &ReturnKey) -> Option<Arc<dyn SuccessHandler>> {
        self.success
            .get(key)
            .or_else(|| self.success.get(&ReturnKey::json_default()))
            .map(Arc::clone)
    }

    /// Exact entry for the key, else the default key's entry.
    #[must_use]
    pub fn error_for(&self, key: &ReturnKey) -> Option<Arc<dyn ErrorHandler>> {
        self.error
            .get(key)
            .or_else(|| self.error.get(&ReturnKey::json_default()))
            .map(Arc::clone)
    }

    /// The default-key error handler, used for failures with no route.
    #[must_use]
    pub fn default_error(&self) -> Option<Arc<dyn ErrorHandler>> {
        self.error.get(&ReturnKey::json_default()).map(Arc::clone)
    }
}

impl fmt::Debug for ResponseHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseHandlerRegistry")
            .field("success", &self.success.keys().collect::<Vec<_>>())
            .field("error", &self.error.keys().collect::<Vec<_>>())
            .finish()
    }
}
