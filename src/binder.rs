//! Parameter binding: from a matched route and a raw request to the typed
//! argument list a handler is invoked with.
//!
//! Each route carries a [`HandlerBinding`], the ordered slot plan declared
//! at registration. The [`ParameterBinder`] fills the plan from the match's
//! path variables, the query string, the terminus, and the body stream,
//! converting values through the injected registries. Every failure is a
//! typed [`BindError`] so the dispatcher can tell bad client input from a
//! wiring fault.

use std::io;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::body::DeserializerRegistry;
use crate::convert::ConverterRegistry;
use crate::error::BindError;
use crate::request::ServerRequest;
use crate::router::RouteMatch;

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSlot {
    /// The request object itself, reachable through the call.
    Request,
    /// The response object, for handlers that write it directly.
    Response,
    /// A path variable, converted to the declared type.
    Path { name: String, ty: String },
    /// A query parameter. Scalar slots take the first value of a repeated
    /// key; `repeated` slots collect all of them.
    Query {
        name: String,
        ty: String,
        repeated: bool,
        required: bool,
    },
    /// The unconsumed remainder of the request target, as a string.
    Terminus,
    /// The deserialized request body.
    Body,
}

impl ParamSlot {
    /// A path variable slot.
    #[must_use]
    pub fn path(name: impl Into<String>, ty: impl Into<String>) -> Self {
        ParamSlot::Path {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// An optional scalar query parameter; missing binds JSON null.
    #[must_use]
    pub fn query(name: impl Into<String>, ty: impl Into<String>) -> Self {
        ParamSlot::Query {
            name: name.into(),
            ty: ty.into(),
            repeated: false,
            required: false,
        }
    }

    /// A scalar query parameter that must be present.
    #[must_use]
    pub fn required_query(name: impl Into<String>, ty: impl Into<String>) -> Self {
        ParamSlot::Query {
            name: name.into(),
            ty: ty.into(),
            repeated: false,
            required: true,
        }
    }

    /// A repeated query parameter; collects every value, possibly none.
    #[must_use]
    pub fn query_list(name: impl Into<String>, ty: impl Into<String>) -> Self {
        ParamSlot::Query {
            name: name.into(),
            ty: ty.into(),
            repeated: true,
            required: false,
        }
    }
}

/// The ordered slot plan for one handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerBinding {
    slots: Vec<ParamSlot>,
}

impl HandlerBinding {
    #[must_use]
    pub fn new(slots: Vec<ParamSlot>) -> Self {
        Self { slots }
    }

    /// A handler taking no bound arguments.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    #[must_use]
    pub fn has_body_slot(&self) -> bool {
        self.slots.iter().any(|s| matches!(s, ParamSlot::Body))
    }
}

/// One bound argument, positionally matching the slot plan.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Placeholder for a request slot; the handler reads the call's request.
    Request,
    /// Placeholder for a response slot.
    Response,
    /// A converted path or query value. JSON null for an optional query
    /// parameter that was absent.
    Scalar(Value),
    /// All values of a repeated query parameter.
    ScalarList(Vec<Value>),
    /// The match terminus, verbatim.
    Terminus(String),
    /// The deserialized request body.
    Body(Value),
}

impl BoundValue {
    /// The scalar or body value, if this argument carries one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            BoundValue::Scalar(v) | BoundValue::Body(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            BoundValue::ScalarList(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_terminus(&self) -> Option<&str> {
        match self {
            BoundValue::Terminus(t) => Some(t),
            _ => None,
        }
    }
}

/// Decoded query pairs that passed the literal-appearance guard.
///
/// A parameter is honored only if its decoded key literally appears after a
/// `?` or `&` in the raw query string. Anything a transport layer merged in
/// from elsewhere (form bodies, defaults) never has that shape, and a key
/// that only occurs percent-encoded is conservatively dropped. Bare flags
/// without `=` are dropped for the same reason.
fn guarded_query_pairs(request: &ServerRequest) -> Vec<(String, String)> {
    let Some(raw) = request.query() else {
        return Vec::new();
    };
    let haystack = format!("?{raw}");
    url::form_urlencoded::parse(raw.as_bytes())
        .filter(|(key, _)| {
            haystack.contains(&format!("?{key}=")) || haystack.contains(&format!("&{key}="))
        })
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Fills a route's slot plan from a request.
#[derive(Debug, Clone)]
pub struct ParameterBinder {
    converters: Arc<ConverterRegistry>,
    deserializers: Arc<DeserializerRegistry>,
}

impl ParameterBinder {
    #[must_use]
    pub fn new(converters: Arc<ConverterRegistry>, deserializers: Arc<DeserializerRegistry>) -> Self {
        Self {
            converters,
            deserializers,
        }
    }

    /// A binder with the default converters and the JSON body codec.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(ConverterRegistry::with_defaults()),
            Arc::new(DeserializerRegistry::with_default_json(None)),
        )
    }

    /// Bind every slot of the matched route, in declared order.
    ///
    /// Takes the request mutably because a body slot consumes the body
    /// stream; everything else reads.
    pub fn bind(
        &self,
        matched: &RouteMatch,
        request: &mut ServerRequest,
    ) -> Result<Vec<BoundValue>, BindError> {
        let route = matched.route();
        let slots = route.binding().slots();
        let mut args = Vec::with_capacity(slots.len());
        let mut query_pairs: Option<Vec<(String, String)>> = None;

        for slot in slots {
            let bound = match slot {
                ParamSlot::Request => BoundValue::Request,
                ParamSlot::Response => BoundValue::Response,
                ParamSlot::Path { name, ty } => {
                    let raw = matched
                        .variable(name)
                        .ok_or_else(|| BindError::MissingPathVariable(name.clone()))?;
                    let value = self.converters.convert(ty, raw).map_err(|source| {
                        BindError::Convert {
                            name: name.clone(),
                            source,
                        }
                    })?;
                    BoundValue::Scalar(value)
                }
                ParamSlot::Query {
                    name,
                    ty,
                    repeated,
                    required,
                } => {
                    let pairs =
                        query_pairs.get_or_insert_with(|| guarded_query_pairs(request));
                    if *repeated {
                        let mut values = Vec::new();
                        for (_, raw) in pairs.iter().filter(|(k, _)| k == name) {
                            let value = self.converters.convert(ty, raw).map_err(|source| {
                                BindError::Convert {
                                    name: name.clone(),
                                    source,
                                }
                            })?;
                            values.push(value);
                        }
                        BoundValue::ScalarList(values)
                    } else {
                        match pairs.iter().find(|(k, _)| k == name) {
                            Some((_, raw)) => {
                                let value =
                                    self.converters.convert(ty, raw).map_err(|source| {
                                        BindError::Convert {
                                            name: name.clone(),
                                            source,
                                        }
                                    })?;
                                BoundValue::Scalar(value)
                            }
                            None if *required => {
                                return Err(BindError::MissingQueryParameter(name.clone()))
                            }
                            None => BoundValue::Scalar(Value::Null),
                        }
                    }
                }
                ParamSlot::Terminus => BoundValue::Terminus(matched.terminus().to_string()),
                ParamSlot::Body => {
                    let format = route.request_format();
                    let deserializer = self
                        .deserializers
                        .find(format)
                        .ok_or_else(|| BindError::NoDeserializer(format.to_string()))?;
                    let charset = request.charset().map(str::to_string);
                    let mut stream = request
                        .take_body()
                        .unwrap_or_else(|| Box::new(io::empty()));
                    let value = deserializer.deserialize(
                        &mut stream,
                        route.request_model(),
                        charset.as_deref(),
                    )?;
                    BoundValue::Body(value)
                }
            };
            args.push(bound);
        }

        debug!(
            handler = %route.handler_id(),
            slots = slots.len(),
            "Bound handler arguments"
        );
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn guard_honors_first_and_subsequent_parameters() {
        let req = ServerRequest::new(Method::GET, "/teams?pageSize=30&page=4");
        let pairs = guarded_query_pairs(&req);
        assert_eq!(
            pairs,
            vec![
                ("pageSize".to_string(), "30".to_string()),
                ("page".to_string(), "4".to_string())
            ]
        );
    }

    #[test]
    fn guard_drops_percent_encoded_keys_and_bare_flags() {
        let req = ServerRequest::new(Method::GET, "/x?page%20size=3&verbose&real=1");
        let pairs = guarded_query_pairs(&req);
        assert_eq!(pairs, vec![("real".to_string(), "1".to_string())]);
    }

    #[test]
    fn guard_keeps_repeated_values_in_order() {
        let req = ServerRequest::new(Method::GET, "/x?tag=a&tag=b&tag=c");
        let pairs = guarded_query_pairs(&req);
        let tags: Vec<&str> = pairs.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(tags, ["a", "b", "c"]);
    }
}
