//! Serializable catalog of resolved routes.
//!
//! The catalog is plain data derived from a route list: one descriptor per
//! route with its method, path, negotiation strings, and handler id. The
//! endpoint-catalog route serves it as JSON, and callers can build it
//! directly for diagnostics.

use std::sync::Arc;

use serde::Serialize;

use crate::route::Route;

/// One route, flattened for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_format: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_model: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub response_format: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub response_model: String,
    pub handler: String,
    pub dynamic: bool,
    /// Ready-to-paste `Accept` header selecting this route, when it
    /// declares a response format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_example: Option<String>,
    /// Ready-to-paste `Content-Type` header, when it declares a request
    /// format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type_example: Option<String>,
}

fn header_example(name: &str, format: &str, model: &str) -> Option<String> {
    if format.is_empty() {
        None
    } else if model.is_empty() {
        Some(format!("{name}: {format}"))
    } else {
        Some(format!("{name}: {format}; model={model}"))
    }
}

impl From<&Route> for RouteDescriptor {
    fn from(route: &Route) -> Self {
        Self {
            method: route.method().to_string(),
            path: route.template().pattern().to_string(),
            request_format: route.request_format().to_string(),
            request_model: route.request_model().to_string(),
            response_format: route.response_format().to_string(),
            response_model: route.response_model().to_string(),
            handler: route.handler_id().to_string(),
            dynamic: route.is_dynamic(),
            accept_example: header_example(
                "Accept",
                route.response_format(),
                route.response_model(),
            ),
            content_type_example: header_example(
                "Content-Type",
                route.request_format(),
                route.request_model(),
            ),
        }
    }
}

/// Catalog of every route in a table, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCatalog {
    pub routes: Vec<RouteDescriptor>,
}

impl RouteCatalog {
    #[must_use]
    pub fn describe(routes: &[Arc<Route>]) -> Self {
        Self {
            routes: routes
                .iter()
                .map(|route| RouteDescriptor::from(route.as_ref()))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
