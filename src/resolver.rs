//! Registration: from declarative endpoint definitions to a route table.
//!
//! Registration is plain data in, plain data out. A [`ResourceDef`] groups
//! endpoints under a path prefix and supplies default negotiation strings;
//! each [`EndpointDef`] may override them. The [`EndpointResolver`] parses
//! and validates templates, picks response handlers out of the registry by
//! the endpoint's return key, assembles [`Route`]s, and builds the ordered,
//! deduplicated [`RouteTable`]. Nothing here inspects handler internals;
//! a handler is an opaque callable plus a binding plan.

use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::{debug, info};

use crate::binder::HandlerBinding;
use crate::config::RouterConfig;
use crate::error::{HandlerError, RegistrationError};
use crate::handler::{Handler, HandlerCall};
use crate::path::PathTemplate;
use crate::response_handlers::{ResponseHandlerRegistry, ReturnKey};
use crate::route::{ErrorStatus, Route, RouteParts};
use crate::table::RouteTable;

/// Endpoint-level value falling back to the resource default. An empty
/// override behaves like an absent one.
fn inherit(endpoint: Option<&str>, resource: &str) -> String {
    match endpoint {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => resource.to_string(),
    }
}

fn join_prefix(outer: &str, inner: &str) -> String {
    format!(
        "{}/{}",
        outer.trim_end_matches('/'),
        inner.trim_start_matches('/')
    )
}

/// One endpoint under a resource.
pub struct EndpointDef {
    method: Method,
    template: String,
    request_format: Option<String>,
    request_model: Option<String>,
    response_format: Option<String>,
    response_model: Option<String>,
    handler_id: String,
    handler: Arc<dyn Handler>,
    binding: HandlerBinding,
    error_statuses: Vec<ErrorStatus>,
}

impl EndpointDef {
    #[must_use]
    pub fn new(
        method: Method,
        template: impl Into<String>,
        handler_id: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            method,
            template: template.into(),
            request_format: None,
            request_model: None,
            response_format: None,
            response_model: None,
            handler_id: handler_id.into(),
            handler,
            binding: HandlerBinding::empty(),
            error_statuses: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_request_format(mut self, format: impl Into<String>) -> Self {
        self.request_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_request_model(mut self, model: impl Into<String>) -> Self {
        self.request_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_response_model(mut self, model: impl Into<String>) -> Self {
        self.response_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_binding(mut self, binding: HandlerBinding) -> Self {
        self.binding = binding;
        self
    }

    /// Declare a status mapping for an error kind the handler may report.
    #[must_use]
    pub fn with_error_status(mut self, status: ErrorStatus) -> Self {
        self.error_statuses.push(status);
        self
    }
}

impl fmt::Debug for EndpointDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDef")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("handler_id", &self.handler_id)
            .finish()
    }
}

/// A group of endpoints sharing a path prefix and default negotiation
/// strings. Like the route axes themselves, the response format defaults
/// to JSON and everything else to unconstrained.
#[derive(Debug)]
pub struct ResourceDef {
    path_prefix: String,
    request_format: String,
    request_model: String,
    response_format: String,
    response_model: String,
    endpoints: Vec<EndpointDef>,
}

impl ResourceDef {
    #[must_use]
    pub fn new(path_prefix: impl Into<String>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            request_format: String::new(),
            request_model: String::new(),
            response_format: "application/json".to_string(),
            response_model: String::new(),
            endpoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_request_format(mut self, format: impl Into<String>) -> Self {
        self.request_format = format.into();
        self
    }

    #[must_use]
    pub fn with_request_model(mut self, model: impl Into<String>) -> Self {
        self.request_model = model.into();
        self
    }

    #[must_use]
    pub fn with_response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = format.into();
        self
    }

    #[must_use]
    pub fn with_response_model(mut self, model: impl Into<String>) -> Self {
        self.response_model = model.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: EndpointDef) -> Self {
        self.endpoints.push(endpoint);
        self
    }
}

/// Builds the route table from resource definitions.
#[derive(Debug)]
pub struct EndpointResolver {
    handlers: ResponseHandlerRegistry,
    config: RouterConfig,
}

impl EndpointResolver {
    #[must_use]
    pub fn new(handlers: ResponseHandlerRegistry, config: RouterConfig) -> Self {
        Self { handlers, config }
    }

    /// Resolve every resource into routes and build the table.
    ///
    /// Fails on the first invalid definition: an unparseable template, a
    /// wildcard response format, or a return key with no response handler
    /// even under the default key. Duplicate routes are not an error; the
    /// table keeps the first and warns.
    pub fn resolve(&self, resources: Vec<ResourceDef>) -> Result<RouteTable, RegistrationError> {
        let mut table = RouteTable::new();
        for resource in resources {
            debug!(
                prefix = %resource.path_prefix,
                endpoints = resource.endpoints.len(),
                "registering resource"
            );
            let ResourceDef {
                path_prefix,
                request_format,
                request_model,
                response_format,
                response_model,
                endpoints,
            } = resource;
            let prefix = join_prefix(&self.config.path_prefix, &path_prefix);
            for endpoint in endpoints {
                let route = self.build_route(
                    &prefix,
                    (&request_format, &request_model),
                    (&response_format, &response_model),
                    endpoint,
                )?;
                table.insert(route);
            }
        }
        if self.config.expose_endpoints {
            let route = self.catalog_route(&table)?;
            table.insert(route);
        }
        info!(routes = table.len(), "route table built");
        Ok(table)
    }

    fn build_route(
        &self,
        prefix: &str,
        consumes: (&str, &str),
        produces: (&str, &str),
        endpoint: EndpointDef,
    ) -> Result<Arc<Route>, RegistrationError> {
        let template = PathTemplate::parse(prefix, &endpoint.template)?;
        let request_format = inherit(endpoint.request_format.as_deref(), consumes.0);
        let request_model = inherit(endpoint.request_model.as_deref(), consumes.1);
        let response_format = inherit(endpoint.response_format.as_deref(), produces.0);
        let response_model = inherit(endpoint.response_model.as_deref(), produces.1);

        let key = ReturnKey::new(response_model.clone(), response_format.clone());
        let success_handler = self.handlers.success_for(&key).ok_or_else(|| {
            RegistrationError::MissingResponseHandler {
                model: key.model().to_string(),
                format: key.format().to_string(),
            }
        })?;
        let error_handler = self.handlers.error_for(&key).ok_or_else(|| {
            RegistrationError::MissingResponseHandler {
                model: key.model().to_string(),
                format: key.format().to_string(),
            }
        })?;

        let route = Route::from_parts(RouteParts {
            method: endpoint.method,
            template,
            request_format,
            request_model,
            response_format,
            response_model,
            handler_id: endpoint.handler_id,
            handler: endpoint.handler,
            binding: endpoint.binding,
            success_handler,
            error_handler,
            error_statuses: endpoint.error_statuses,
            dynamic: false,
        })?;
        debug!(route = %route, "route registered");
        Ok(Arc::new(route))
    }

    /// The `GET {prefix}/endpoints` route serving the catalog of every
    /// route registered before it.
    fn catalog_route(&self, table: &RouteTable) -> Result<Arc<Route>, RegistrationError> {
        let catalog = table.catalog();
        let handler: Arc<dyn Handler> = Arc::new(move |_call: &mut HandlerCall<'_>| {
            serde_json::to_value(&catalog)
                .map_err(|err| HandlerError::from_error("CatalogSerialization", &err))
        });
        let key = ReturnKey::json_default();
        let success_handler = self.handlers.success_for(&key).ok_or_else(|| {
            RegistrationError::MissingResponseHandler {
                model: key.model().to_string(),
                format: key.format().to_string(),
            }
        })?;
        let error_handler = self.handlers.error_for(&key).ok_or_else(|| {
            RegistrationError::MissingResponseHandler {
                model: key.model().to_string(),
                format: key.format().to_string(),
            }
        })?;
        let route = Route::from_parts(RouteParts {
            method: Method::GET,
            template: PathTemplate::parse(&self.config.path_prefix, "/endpoints")?,
            request_format: String::new(),
            request_model: String::new(),
            response_format: "application/json".to_string(),
            response_model: String::new(),
            handler_id: "endpoints.catalog".to_string(),
            handler,
            binding: HandlerBinding::empty(),
            success_handler,
            error_handler,
            error_statuses: Vec::new(),
            dynamic: false,
        })?;
        Ok(Arc::new(route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ServerRequest;
    use crate::response::ServerResponse;
    use serde_json::Value;

    fn noop() -> Arc<dyn Handler> {
        Arc::new(|_: &mut HandlerCall<'_>| Ok(Value::Null))
    }

    fn resolver(config: RouterConfig) -> EndpointResolver {
        EndpointResolver::new(ResponseHandlerRegistry::with_json_defaults(), config)
    }

    #[test]
    fn endpoints_inherit_resource_defaults() {
        let resources = vec![ResourceDef::new("/teams")
            .with_request_format("application/json")
            .with_response_model("urn:example:team")
            .with_endpoint(EndpointDef::new(Method::GET, "/{name}", "teams.get", noop()))];
        let table = resolver(RouterConfig::default()).resolve(resources).unwrap();
        let route = &table.routes()[0];
        assert_eq!(route.template().pattern(), "/teams/{name}");
        assert_eq!(route.request_format(), "application/json");
        assert_eq!(route.response_format(), "application/json");
        assert_eq!(route.response_model(), "urn:example:team");
    }

    #[test]
    fn endpoint_overrides_beat_resource_defaults() {
        let resources = vec![ResourceDef::new("/teams")
            .with_response_model("urn:example:team")
            .with_endpoint(
                EndpointDef::new(Method::GET, "/all", "teams.list", noop())
                    .with_response_model("urn:example:teamlist"),
            )
            .with_endpoint(
                // An empty override behaves like an absent one.
                EndpointDef::new(Method::GET, "/first", "teams.first", noop())
                    .with_response_model(""),
            )];
        let table = resolver(RouterConfig::default()).resolve(resources).unwrap();
        let all = table
            .iter()
            .find(|r| r.handler_id() == "teams.list")
            .unwrap();
        let first = table
            .iter()
            .find(|r| r.handler_id() == "teams.first")
            .unwrap();
        assert_eq!(all.response_model(), "urn:example:teamlist");
        assert_eq!(first.response_model(), "urn:example:team");
    }

    #[test]
    fn service_prefix_is_joined_ahead_of_resources() {
        let config = RouterConfig {
            path_prefix: "/api/v1".to_string(),
            ..RouterConfig::default()
        };
        let resources = vec![ResourceDef::new("/teams")
            .with_endpoint(EndpointDef::new(Method::GET, "/{name}", "teams.get", noop()))];
        let table = resolver(config).resolve(resources).unwrap();
        assert_eq!(table.routes()[0].template().pattern(), "/api/v1/teams/{name}");
    }

    #[test]
    fn wildcard_response_format_fails_registration() {
        let resources = vec![ResourceDef::new("/teams")
            .with_response_format("*/*")
            .with_endpoint(EndpointDef::new(Method::GET, "/all", "teams.list", noop()))];
        let err = resolver(RouterConfig::default())
            .resolve(resources)
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::WildcardResponseFormat { .. }
        ));
    }

    #[test]
    fn empty_registry_rejects_registration() {
        let resolver = EndpointResolver::new(
            ResponseHandlerRegistry::empty(),
            RouterConfig::default(),
        );
        let resources = vec![ResourceDef::new("/teams")
            .with_endpoint(EndpointDef::new(Method::GET, "/all", "teams.list", noop()))];
        let err = resolver.resolve(resources).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::MissingResponseHandler { .. }
        ));
    }

    #[test]
    fn catalog_route_serves_previously_registered_routes() {
        let config = RouterConfig {
            expose_endpoints: true,
            ..RouterConfig::default()
        };
        let resources = vec![ResourceDef::new("/teams")
            .with_endpoint(EndpointDef::new(Method::GET, "/{name}", "teams.get", noop()))];
        let table = resolver(config).resolve(resources).unwrap();
        assert_eq!(table.len(), 2);

        let catalog_route = table
            .iter()
            .find(|r| r.handler_id() == "endpoints.catalog")
            .unwrap();
        assert_eq!(catalog_route.template().pattern(), "/endpoints");

        let request = ServerRequest::new(Method::GET, "/endpoints");
        let mut response = ServerResponse::new();
        let mut call =
            HandlerCall::new(catalog_route.as_ref(), Vec::new(), &request, &mut response);
        let value = catalog_route.handler().invoke(&mut call).unwrap();
        let paths: Vec<&str> = value["routes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["/teams/{name}"]);
    }
}
