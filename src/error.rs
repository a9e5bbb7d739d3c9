//! Typed errors shared across the binding, codec, and dispatch layers.
//!
//! Routing failures (404/405/406/415) are *values*, not errors, and live in
//! [`crate::router::RouteFailure`]. The types here cover everything that can
//! go wrong while converting, deserializing, binding, or formatting, plus
//! [`HandlerError`], the currency handlers use to report their own failures.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::path::TemplateError;

/// Error code attached to client-input failures in the structured error body.
pub const ERROR_CODE_BAD_INPUT: &str = "BAD_INPUT_IN_REQUEST";

/// A string value could not be converted to a declared parameter type.
#[derive(Debug, Error)]
pub enum TypeConversionError {
    /// No converter is registered under the declared type name.
    #[error("no converter registered for type '{0}'")]
    Unsupported(String),

    /// The raw value does not parse as the declared type.
    #[error("'{value}' is not a valid {ty}")]
    Invalid { ty: String, value: String },

    /// The raw value parsed under none of the accepted date formats.
    #[error("'{0}' does not match any accepted date format")]
    UnparseableDate(String),
}

/// A request body could not be turned into a value.
#[derive(Debug, Error)]
pub enum DeserializationError {
    /// The body was read but did not parse under the negotiated format.
    #[error("malformed {format} body")]
    Malformed {
        format: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The request declared a character encoding the codec does not support.
    #[error("unsupported character encoding '{0}'")]
    UnsupportedEncoding(String),

    /// The body exceeded the configured size cap.
    #[error("request body exceeds the {limit}-byte cap")]
    TooLarge { limit: usize },

    /// The body stream failed mid-read.
    #[error("failed reading request body")]
    Io(#[from] std::io::Error),
}

/// A response value could not be serialized for the wire.
#[derive(Debug, Error)]
pub enum FormatterError {
    #[error("failed to serialize response value")]
    Serialize(#[from] serde_json::Error),
}

/// Argument binding failed before the handler could be invoked.
#[derive(Debug, Error)]
pub enum BindError {
    /// The binding plan names a path variable the template never captured.
    /// This is a registration-time wiring fault, not client input.
    #[error("path variable '{0}' was not captured by the matched template")]
    MissingPathVariable(String),

    /// A required query parameter is absent from the query string.
    #[error("required query parameter '{0}' is missing")]
    MissingQueryParameter(String),

    /// A path or query value failed type conversion.
    #[error("parameter '{name}' is invalid")]
    Convert {
        name: String,
        #[source]
        source: TypeConversionError,
    },

    /// The route's negotiated request format has no registered deserializer.
    #[error("no deserializer registered for request format '{0}'")]
    NoDeserializer(String),

    /// The body deserializer rejected the request body.
    #[error(transparent)]
    Deserialize(#[from] DeserializationError),
}

impl BindError {
    /// Status to pre-set on the response when the failure is client-caused.
    /// `None` means the fault is on the server side and the error handler's
    /// default 500 applies.
    #[must_use]
    pub fn client_status(&self) -> Option<u16> {
        match self {
            BindError::MissingPathVariable(_) => None,
            BindError::Deserialize(DeserializationError::TooLarge { .. }) => Some(413),
            _ => Some(400),
        }
    }
}

/// A route definition was rejected at registration time.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The path template failed to parse.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Routes may consume `*/*` but never produce it.
    #[error("{method} {pattern}: wildcard */* is not a valid response format")]
    WildcardResponseFormat { method: String, pattern: String },

    /// Neither the endpoint's return key nor the default key has a
    /// registered response handler.
    #[error("no response handler registered for model {model:?} format {format:?}")]
    MissingResponseHandler { model: String, format: String },
}

/// Failure reported by a handler, carried to the error response handler.
///
/// Mirrors the structured error body on the wire: a kind (the class of
/// failure), an ordered causal message chain (outermost first), an optional
/// machine-readable code, and the input fields implicated in the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    kind: String,
    messages: Vec<String>,
    code: Option<String>,
    fields: Vec<String>,
}

impl HandlerError {
    /// Create an error of the given kind with a single message.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            messages: vec![message.into()],
            code: None,
            fields: Vec::new(),
        }
    }

    /// A client-input validation failure implicating specific request fields.
    /// Carries the [`ERROR_CODE_BAD_INPUT`] code.
    pub fn validation(
        message: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            kind: "FieldValidation".to_string(),
            messages: vec![message.into()],
            code: Some(ERROR_CODE_BAD_INPUT.to_string()),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from any error, walking its `source()` chain into the message
    /// list (outermost first).
    pub fn from_error(kind: impl Into<String>, err: &(dyn StdError + 'static)) -> Self {
        let mut messages = vec![err.to_string()];
        let mut cause = err.source();
        while let Some(c) = cause {
            messages.push(c.to_string());
            cause = c.source();
        }
        Self {
            kind: kind.into(),
            messages,
            code: None,
            fields: Vec::new(),
        }
    }

    /// Attach a machine-readable error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Implicate request fields in the failure.
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append an underlying cause to the message chain.
    #[must_use]
    pub fn caused_by(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Causal message chain, outermost first. Never empty.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.messages.first() {
            Some(m) => write!(f, "{}: {m}", self.kind),
            None => f.write_str(&self.kind),
        }
    }
}

impl StdError for HandlerError {}

impl From<anyhow::Error> for HandlerError {
    /// Flatten an `anyhow` chain into the message list, outermost first.
    fn from(err: anyhow::Error) -> Self {
        Self {
            kind: "Unhandled".to_string(),
            messages: err.chain().map(|c| c.to_string()).collect(),
            code: None,
            fields: Vec::new(),
        }
    }
}

impl From<BindError> for HandlerError {
    fn from(err: BindError) -> Self {
        let kind = match &err {
            BindError::MissingPathVariable(_) => "MissingPathVariable",
            BindError::MissingQueryParameter(_) => "MissingQueryParameter",
            BindError::Convert { .. } => "TypeConversion",
            BindError::NoDeserializer(_) => "NoDeserializer",
            BindError::Deserialize(_) => "Deserialization",
        };
        let mut out = HandlerError::from_error(kind, &err);
        match &err {
            BindError::MissingQueryParameter(name) | BindError::Convert { name, .. } => {
                out = out
                    .with_code(ERROR_CODE_BAD_INPUT)
                    .with_fields([name.clone()]);
            }
            BindError::Deserialize(_) => {
                out = out.with_code(ERROR_CODE_BAD_INPUT);
            }
            _ => {}
        }
        out
    }
}
