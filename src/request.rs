//! The transport-neutral request value object.
//!
//! Embedding code (an HTTP server adapter, a test) builds a
//! [`ServerRequest`] from whatever wire representation it has; the router
//! and binder only ever see this type. Header names are stored lowercased
//! so lookups are case-insensitive. The body is an opaque byte stream that
//! the binder hands to the negotiated deserializer.

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};

use http::Method;

/// Returns the text after a leading case-insensitive `charset=`, if present.
fn strip_charset_prefix(segment: &str) -> Option<&str> {
    let head = segment.get(..8)?;
    if head.eq_ignore_ascii_case("charset=") {
        segment.get(8..)
    } else {
        None
    }
}

/// An HTTP request as the routing pipeline sees it.
pub struct ServerRequest {
    method: Method,
    target: String,
    headers: HashMap<String, String>,
    body: Option<Box<dyn Read + Send>>,
}

impl ServerRequest {
    /// Create a request for the given method and raw target
    /// (path plus optional `?query`).
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Attach a header. Names are lowercased; a repeated name replaces the
    /// earlier value.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Attach an in-memory body.
    #[must_use]
    pub fn with_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Box::new(Cursor::new(bytes.into())));
        self
    }

    /// Attach a streaming body.
    #[must_use]
    pub fn with_body_stream(mut self, reader: Box<dyn Read + Send>) -> Self {
        self.body = Some(reader);
        self
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw request target, path plus optional `?query`.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The path part of the target.
    #[must_use]
    pub fn path(&self) -> &str {
        match self.target.find('?') {
            Some(idx) => &self.target[..idx],
            None => &self.target,
        }
    }

    /// The raw query string after `?`, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.target.find('?').map(|idx| &self.target[idx + 1..])
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.header("accept")
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The character encoding declared in `Content-Type`, unquoted.
    /// Absence means UTF-8 to the body codec.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.content_type()?
            .split(';')
            .skip(1)
            .map(str::trim)
            .find_map(strip_charset_prefix)
            .map(|v| v.trim().trim_matches('"'))
    }

    /// Take the body stream, leaving the request bodyless. The binder calls
    /// this once when a route declares a body slot.
    pub fn take_body(&mut self) -> Option<Box<dyn Read + Send>> {
        self.body.take()
    }
}

impl fmt::Debug for ServerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerRequest")
            .field("method", &self.method)
            .field("target", &self.target)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_and_query_split_on_first_question_mark() {
        let req = ServerRequest::new(Method::GET, "/teams/a?x=1&y=?2");
        assert_eq!(req.path(), "/teams/a");
        assert_eq!(req.query(), Some("x=1&y=?2"));

        let bare = ServerRequest::new(Method::GET, "/teams/a");
        assert_eq!(bare.path(), "/teams/a");
        assert_eq!(bare.query(), None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = ServerRequest::new(Method::GET, "/").with_header("Accept", "application/json");
        assert_eq!(req.header("ACCEPT"), Some("application/json"));
        assert_eq!(req.accept(), Some("application/json"));
    }

    #[test]
    fn charset_is_extracted_and_unquoted() {
        let req = ServerRequest::new(Method::POST, "/")
            .with_header("Content-Type", "application/json; Charset=\"ISO-8859-1\"");
        assert_eq!(req.charset(), Some("ISO-8859-1"));

        let plain = ServerRequest::new(Method::POST, "/")
            .with_header("Content-Type", "application/json");
        assert_eq!(plain.charset(), None);
    }

    #[test]
    fn take_body_consumes_the_stream() {
        let mut req = ServerRequest::new(Method::POST, "/").with_body(b"{}".to_vec());
        let mut body = req.take_body().unwrap();
        let mut out = String::new();
        body.read_to_string(&mut out).unwrap();
        assert_eq!(out, "{}");
        assert!(req.take_body().is_none());
    }
}
