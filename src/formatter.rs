//! Response body serialization.
//!
//! Formatters are the writing half of the codec seam: a response handler
//! picks one and asks it to turn the handler's return value into wire
//! bytes. The default emits compact JSON.

use serde_json::Value;

use crate::error::FormatterError;

/// Serializes a response value for the wire.
pub trait ResponseFormatter: Send + Sync {
    /// The `Content-Type` value stamped on responses this formatter writes.
    fn content_type(&self) -> &str;

    fn format(&self, value: &Value) -> Result<Vec<u8>, FormatterError>;
}

/// Compact JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl ResponseFormatter for JsonFormatter {
    fn content_type(&self) -> &str {
        "application/json;charset=UTF-8"
    }

    fn format(&self, value: &Value) -> Result<Vec<u8>, FormatterError> {
        Ok(serde_json::to_vec(value)?)
    }
}
