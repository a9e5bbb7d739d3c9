//! MIME keys for content negotiation.
//!
//! A [`MimeKey`] is parsed from one fragment of an `Accept` header or from a
//! `Content-Type` value: a format (`application/json`) optionally qualified
//! by a `model=` attribute naming the schema/model the caller produces or
//! expects (`application/json; model=urn:example:team`). The same parse and
//! match algorithm serves both sides of the exchange through two role
//! wrappers: [`ResponseKey`] (what the client will accept back) and
//! [`BodyKey`] (what the client says it is sending).
//!
//! The `model` field distinguishes three states that match differently:
//! unset (no `model=` attribute), explicitly empty (`model=` with nothing
//! after it), and set. An unset model only matches routes that declare no
//! model of their own; an explicitly empty one matches any.

/// The match-anything media range.
pub const WILDCARD: &str = "*/*";

/// One parsed media-range fragment: format plus optional model qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeKey {
    format: Option<String>,
    model: Option<String>,
}

/// Returns the text after a leading case-insensitive `model=`, if present.
fn strip_model_prefix(segment: &str) -> Option<&str> {
    let head = segment.get(..6)?;
    if head.eq_ignore_ascii_case("model=") {
        segment.get(6..)
    } else {
        None
    }
}

impl MimeKey {
    /// Parse a media-range fragment.
    ///
    /// `None` yields a key with both fields unset, which matches only routes
    /// declaring neither a format nor a model on the relevant side. For
    /// `Some`, the text before the first `;` (trimmed) is the format; the
    /// remaining `;`-separated attributes are scanned for the first whose
    /// trimmed form starts with `model=` case-insensitively. The model value
    /// is everything after that `=`, with no further trimming, so
    /// `model= x` keeps its leading space. Other attributes (`charset`,
    /// `q`, ...) are ignored.
    #[must_use]
    pub fn parse(fragment: Option<&str>) -> Self {
        let Some(fragment) = fragment else {
            return Self {
                format: None,
                model: None,
            };
        };
        let mut segments = fragment.split(';');
        let format = segments.next().unwrap_or("").trim().to_string();
        let model = segments
            .map(str::trim)
            .find_map(strip_model_prefix)
            .map(str::to_string);
        Self {
            format: Some(format),
            model,
        }
    }

    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Test this key against one side of a route's declaration, where absent
    /// declarations are empty strings.
    ///
    /// A route-side format of `*/*` (a consume-anything route) matches every
    /// key. Otherwise:
    ///
    /// - key format unset or empty: matches only a side with no format and
    ///   no model;
    /// - key format `*/*`: matches unless the key pins a model that differs
    ///   from the route's;
    /// - key format equal (case-insensitive): an unset key model requires a
    ///   modelless route, an explicitly empty one matches anything, a set
    ///   one must agree case-insensitively.
    #[must_use]
    pub fn matches(&self, format: &str, model: &str) -> bool {
        if format == WILDCARD {
            return true;
        }
        match self.format.as_deref() {
            None | Some("") => format.is_empty() && model.is_empty(),
            Some(WILDCARD) => match self.model.as_deref() {
                None | Some("") => true,
                Some(m) => m.eq_ignore_ascii_case(model),
            },
            Some(f) if f.eq_ignore_ascii_case(format) => match self.model.as_deref() {
                None => model.is_empty(),
                Some("") => true,
                Some(m) => m.eq_ignore_ascii_case(model),
            },
            Some(_) => false,
        }
    }
}

/// What the client is willing to accept back: one fragment of `Accept`,
/// matched against a route's response format and model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseKey {
    key: MimeKey,
}

impl ResponseKey {
    #[must_use]
    pub fn parse(fragment: Option<&str>) -> Self {
        Self {
            key: MimeKey::parse(fragment),
        }
    }

    /// Split an `Accept` header into keys, one per comma-separated fragment.
    ///
    /// An absent header, or one that is blank after trimming, means the
    /// client takes anything and yields a single `*/*` key. Empty fragments
    /// within a non-blank header are dropped.
    #[must_use]
    pub fn split_accept(header: Option<&str>) -> Vec<Self> {
        match header.map(str::trim) {
            None | Some("") => vec![Self::parse(Some(WILDCARD))],
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|fragment| !fragment.is_empty())
                .map(|fragment| Self::parse(Some(fragment)))
                .collect(),
        }
    }

    /// Match against a route's response side.
    #[must_use]
    pub fn matches(&self, response_format: &str, response_model: &str) -> bool {
        self.key.matches(response_format, response_model)
    }

    #[must_use]
    pub fn key(&self) -> &MimeKey {
        &self.key
    }
}

/// What the client says it is sending: the `Content-Type` value, matched
/// against a route's request format and model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyKey {
    key: MimeKey,
}

impl BodyKey {
    /// Parse from the `Content-Type` header value. An absent header yields a
    /// key with both fields unset, which still matches routes that declare
    /// no request side (bodyless routes).
    #[must_use]
    pub fn from_content_type(header: Option<&str>) -> Self {
        Self {
            key: MimeKey::parse(header),
        }
    }

    /// Match against a route's request side.
    #[must_use]
    pub fn matches(&self, request_format: &str, request_model: &str) -> bool {
        self.key.matches(request_format, request_model)
    }

    #[must_use]
    pub fn key(&self) -> &MimeKey {
        &self.key
    }
}
