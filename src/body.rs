//! Request body deserialization.
//!
//! The binder selects a deserializer by the route's *negotiated* request
//! format, never by re-inspecting the Content-Type header, so a route that
//! consumes `*/*` still gets the codec its registration chose. The registry
//! is an ordered list; the first entry whose declared format equals the
//! negotiated one (case-insensitively) wins.

use std::io::Read;
use std::sync::Arc;

use serde_json::Value;

use crate::error::DeserializationError;

/// Turns a request body stream into a value.
pub trait RequestDeserializer: Send + Sync {
    /// The MIME format this deserializer consumes, e.g. `application/json`.
    fn format(&self) -> &str;

    /// Deserialize the stream. `model` names the schema the route consumes
    /// (codecs that validate may use it; the JSON codec does not). `charset`
    /// is the request's declared encoding; `None` means UTF-8.
    fn deserialize(
        &self,
        body: &mut dyn Read,
        model: &str,
        charset: Option<&str>,
    ) -> Result<Value, DeserializationError>;
}

fn is_utf8(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8")
}

/// `application/json` bodies via `serde_json`, with an optional size cap.
#[derive(Debug, Clone, Default)]
pub struct JsonDeserializer {
    max_body_bytes: Option<usize>,
}

impl JsonDeserializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of body bytes read; anything longer fails with
    /// [`DeserializationError::TooLarge`] without buffering the excess.
    #[must_use]
    pub fn with_cap(max_body_bytes: usize) -> Self {
        Self {
            max_body_bytes: Some(max_body_bytes),
        }
    }
}

impl RequestDeserializer for JsonDeserializer {
    fn format(&self) -> &str {
        "application/json"
    }

    fn deserialize(
        &self,
        body: &mut dyn Read,
        _model: &str,
        charset: Option<&str>,
    ) -> Result<Value, DeserializationError> {
        if let Some(cs) = charset {
            if !is_utf8(cs) {
                return Err(DeserializationError::UnsupportedEncoding(cs.to_string()));
            }
        }

        let mut buf = Vec::new();
        match self.max_body_bytes {
            Some(limit) => {
                // Read one byte past the cap so over-cap is detectable
                // without draining the stream.
                body.take(limit as u64 + 1).read_to_end(&mut buf)?;
                if buf.len() > limit {
                    return Err(DeserializationError::TooLarge { limit });
                }
            }
            None => {
                body.read_to_end(&mut buf)?;
            }
        }

        serde_json::from_slice(&buf).map_err(|source| DeserializationError::Malformed {
            format: self.format().to_string(),
            source: Box::new(source),
        })
    }
}

/// Ordered deserializer registry; first format match wins.
#[derive(Clone, Default)]
pub struct DeserializerRegistry {
    deserializers: Vec<Arc<dyn RequestDeserializer>>,
}

impl DeserializerRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding only the JSON codec, capped when a limit is given.
    #[must_use]
    pub fn with_default_json(max_body_bytes: Option<usize>) -> Self {
        let codec = match max_body_bytes {
            Some(limit) => JsonDeserializer::with_cap(limit),
            None => JsonDeserializer::new(),
        };
        let mut registry = Self::empty();
        registry.register(Arc::new(codec));
        registry
    }

    /// Append a deserializer. Registration order is priority order.
    pub fn register(&mut self, deserializer: Arc<dyn RequestDeserializer>) {
        self.deserializers.push(deserializer);
    }

    /// First deserializer declared for `format`, case-insensitively.
    #[must_use]
    pub fn find(&self, format: &str) -> Option<&Arc<dyn RequestDeserializer>> {
        self.deserializers
            .iter()
            .find(|d| d.format().eq_ignore_ascii_case(format))
    }
}

impl std::fmt::Debug for DeserializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let formats: Vec<&str> = self.deserializers.iter().map(|d| d.format()).collect();
        f.debug_struct("DeserializerRegistry")
            .field("formats", &formats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn json_codec_reads_utf8_bodies() {
        let codec = JsonDeserializer::new();
        let mut body = Cursor::new(br#"{"name":"Cubs"}"#.to_vec());
        let value = codec.deserialize(&mut body, "", None).unwrap();
        assert_eq!(value, json!({"name": "Cubs"}));
    }

    #[test]
    fn json_codec_accepts_utf8_charset_spellings() {
        let codec = JsonDeserializer::new();
        for cs in ["utf-8", "UTF-8", "utf8"] {
            let mut body = Cursor::new(b"1".to_vec());
            assert!(codec.deserialize(&mut body, "", Some(cs)).is_ok());
        }
        let mut body = Cursor::new(b"1".to_vec());
        assert!(matches!(
            codec.deserialize(&mut body, "", Some("ISO-8859-1")).unwrap_err(),
            DeserializationError::UnsupportedEncoding(cs) if cs == "ISO-8859-1"
        ));
    }

    #[test]
    fn json_codec_rejects_malformed_bodies() {
        let codec = JsonDeserializer::new();
        let mut body = Cursor::new(b"{not json".to_vec());
        assert!(matches!(
            codec.deserialize(&mut body, "", None).unwrap_err(),
            DeserializationError::Malformed { .. }
        ));
    }

    #[test]
    fn cap_is_enforced_without_reading_everything() {
        let codec = JsonDeserializer::with_cap(8);
        let mut body = Cursor::new(vec![b'9'; 1024]);
        assert!(matches!(
            codec.deserialize(&mut body, "", None).unwrap_err(),
            DeserializationError::TooLarge { limit: 8 }
        ));
    }

    #[test]
    fn registry_lookup_is_case_insensitive_first_match() {
        let registry = DeserializerRegistry::with_default_json(None);
        assert!(registry.find("Application/JSON").is_some());
        assert!(registry.find("text/xml").is_none());
    }
}
