//! Path templates: parsing, matching, and specificity ordering.
//!
//! A template is a `/`-separated pattern where `{name}` captures exactly one
//! segment and a final `*` consumes any remainder. Matching a request target
//! yields the captured variables plus the *terminus*: the verbatim
//! unconsumed tail of the target, which for a closed template is just the
//! raw query string (including its `?`) and for an open one is the greedy
//! tail followed by the query string.
//!
//! Templates order by specificity so that a route table can try the most
//! constrained shape first: literals before variables before tails, with a
//! strict prefix sorting after its extensions.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use smallvec::SmallVec;
use thiserror::Error;

/// Maximum number of path/query parameters before heap allocation.
/// Most REST paths have well under 8 variables.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Names are `Arc<str>` because they come from the template, which is built
/// once at registration; values are per-request strings.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A template failed to parse at registration time.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("duplicate variable '{name}' in template '{pattern}'")]
    DuplicateVariable { pattern: String, name: String },

    #[error("empty variable name in template '{pattern}'")]
    EmptyVariable { pattern: String },

    #[error("wildcard segment must be the last segment in template '{pattern}'")]
    InteriorWildcard { pattern: String },

    #[error("failed to compile matcher for template '{pattern}'")]
    Matcher {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Variable(Arc<str>),
    Tail,
}

impl Segment {
    fn rank(&self) -> u8 {
        match self {
            Segment::Literal(_) => 0,
            Segment::Variable(_) => 1,
            Segment::Tail => 2,
        }
    }

    /// Specificity order: literal < variable < tail; literals by byte order.
    /// Variable names do not participate, so `{id}` and `{key}` tie.
    fn specificity_cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| {
            match (self, other) {
                (Segment::Literal(a), Segment::Literal(b)) => a.cmp(b),
                _ => Ordering::Equal,
            }
        })
    }
}

/// The product of matching a template against a request target.
#[derive(Debug, Clone, Default)]
pub struct PathMatch {
    /// Captured variables in template order, percent-decoded.
    pub variables: ParamVec,
    /// Verbatim unconsumed remainder of the target.
    pub terminus: String,
}

impl PathMatch {
    /// Look up a captured variable by name.
    #[inline]
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    pattern: String,
    segments: Vec<Segment>,
    matcher: Regex,
    variable_names: Vec<Arc<str>>,
    open: bool,
}

impl PathTemplate {
    /// Parse `pattern` under `prefix` into a compiled template.
    ///
    /// The prefix and pattern are joined with a single `/` and empty
    /// segments are dropped, so `("/api/", "//teams/{name}")` and
    /// `("/api", "teams/{name}")` produce the same template.
    pub fn parse(prefix: &str, pattern: &str) -> Result<Self, TemplateError> {
        let joined = format!(
            "{}/{}",
            prefix.trim_end_matches('/'),
            pattern.trim_start_matches('/')
        );

        let mut segments = Vec::new();
        let mut variable_names: Vec<Arc<str>> = Vec::new();
        for raw in joined.split('/').filter(|s| !s.is_empty()) {
            if raw == "*" {
                segments.push(Segment::Tail);
            } else if raw.starts_with('{') && raw.ends_with('}') {
                let name = &raw[1..raw.len() - 1];
                if name.is_empty() {
                    return Err(TemplateError::EmptyVariable {
                        pattern: joined.clone(),
                    });
                }
                if variable_names.iter().any(|n| n.as_ref() == name) {
                    return Err(TemplateError::DuplicateVariable {
                        pattern: joined.clone(),
                        name: name.to_string(),
                    });
                }
                let name: Arc<str> = Arc::from(name);
                variable_names.push(Arc::clone(&name));
                segments.push(Segment::Variable(name));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        if segments
            .iter()
            .position(|s| matches!(s, Segment::Tail))
            .is_some_and(|i| i != segments.len() - 1)
        {
            return Err(TemplateError::InteriorWildcard { pattern: joined });
        }
        let open = matches!(segments.last(), Some(Segment::Tail));

        let mut normalized = String::with_capacity(joined.len());
        let mut expr = String::with_capacity(joined.len() + 8);
        expr.push('^');
        for segment in &segments {
            match segment {
                Segment::Literal(text) => {
                    normalized.push('/');
                    normalized.push_str(text);
                    expr.push('/');
                    expr.push_str(&regex::escape(text));
                }
                Segment::Variable(name) => {
                    normalized.push_str("/{");
                    normalized.push_str(name);
                    normalized.push('}');
                    expr.push_str("/([^/]+)");
                }
                Segment::Tail => {
                    normalized.push_str("/*");
                    expr.push_str("(?:/(.*))?");
                }
            }
        }
        if normalized.is_empty() {
            normalized.push('/');
            expr.push('/');
        }
        expr.push('$');

        let matcher = Regex::new(&expr).map_err(|source| TemplateError::Matcher {
            pattern: normalized.clone(),
            source,
        })?;

        Ok(Self {
            pattern: normalized,
            segments,
            matcher,
            variable_names,
            open,
        })
    }

    /// Normalized pattern, e.g. `/teams/{type}/{name}`.
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Declared variable names in template order.
    #[must_use]
    pub fn variable_names(&self) -> &[Arc<str>] {
        &self.variable_names
    }

    /// Whether the template ends in a greedy tail.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Match a raw request target (path plus optional `?query`).
    ///
    /// The path part must be fully consumed by the template. Variable values
    /// are percent-decoded; values that do not decode cleanly are kept raw.
    /// The terminus is returned verbatim.
    #[must_use]
    pub fn match_target(&self, target: &str) -> Option<PathMatch> {
        let (path, suffix) = match target.find('?') {
            Some(idx) => (&target[..idx], &target[idx..]),
            None => (target, ""),
        };
        let caps = self.matcher.captures(path)?;

        let mut variables = ParamVec::new();
        for (i, name) in self.variable_names.iter().enumerate() {
            let raw = caps.get(i + 1).map_or("", |m| m.as_str());
            let value = urlencoding::decode(raw)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| raw.to_string());
            variables.push((Arc::clone(name), value));
        }

        let mut terminus = String::new();
        if self.open {
            if let Some(tail) = caps.get(self.variable_names.len() + 1) {
                terminus.push_str(tail.as_str());
            }
        }
        terminus.push_str(suffix);

        Some(PathMatch {
            variables,
            terminus,
        })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathTemplate {}

impl PartialOrd for PathTemplate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathTemplate {
    /// Segment-wise specificity; when one template is a strict prefix of
    /// the other, the longer sorts first.
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.segments.iter();
        let mut right = other.segments.iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (Some(a), Some(b)) => match a.specificity_cmp(b) {
                    Ordering::Equal => {}
                    ord => return ord,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(pattern: &str) -> PathTemplate {
        PathTemplate::parse("", pattern).unwrap()
    }

    #[test]
    fn parse_normalizes_prefix_join() {
        let a = PathTemplate::parse("/api/", "//teams/{name}").unwrap();
        let b = PathTemplate::parse("/api", "teams/{name}").unwrap();
        assert_eq!(a.pattern(), "/api/teams/{name}");
        assert_eq!(a.pattern(), b.pattern());
    }

    #[test]
    fn parse_rejects_duplicate_variables() {
        let err = PathTemplate::parse("", "/a/{x}/b/{x}").unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateVariable { name, .. } if name == "x"));
    }

    #[test]
    fn parse_rejects_empty_variable() {
        assert!(matches!(
            PathTemplate::parse("", "/a/{}").unwrap_err(),
            TemplateError::EmptyVariable { .. }
        ));
    }

    #[test]
    fn parse_rejects_interior_wildcard() {
        assert!(matches!(
            PathTemplate::parse("", "/files/*/meta").unwrap_err(),
            TemplateError::InteriorWildcard { .. }
        ));
    }

    #[test]
    fn matches_and_extracts_variables() {
        let t = template("/teams/{type}/{name}");
        let m = t.match_target("/teams/baseball/Cubs").unwrap();
        assert_eq!(m.variable("type"), Some("baseball"));
        assert_eq!(m.variable("name"), Some("Cubs"));
        assert_eq!(m.terminus, "");
    }

    #[test]
    fn variables_are_percent_decoded() {
        let t = template("/teams/{type}/{name}");
        let m = t.match_target("/teams/ice%20hockey/Red%20Wings").unwrap();
        assert_eq!(m.variable("type"), Some("ice hockey"));
        assert_eq!(m.variable("name"), Some("Red Wings"));
    }

    #[test]
    fn closed_template_requires_full_consumption() {
        let t = template("/teams/{type}");
        assert!(t.match_target("/teams/baseball/extra").is_none());
        assert!(t.match_target("/teams").is_none());
    }

    #[test]
    fn terminus_is_the_raw_query_string() {
        let t = template("/teams/{type}/players");
        let m = t.match_target("/teams/baseball/players?pageSize=30&page=4").unwrap();
        assert_eq!(m.variable("type"), Some("baseball"));
        assert_eq!(m.terminus, "?pageSize=30&page=4");
    }

    #[test]
    fn open_template_captures_the_tail() {
        let t = template("/files/*");
        let m = t.match_target("/files/img/logo.png?raw=1").unwrap();
        assert_eq!(m.terminus, "img/logo.png?raw=1");

        let bare = t.match_target("/files").unwrap();
        assert_eq!(bare.terminus, "");
    }

    #[test]
    fn root_template_matches_only_root() {
        let t = template("/");
        assert!(t.match_target("/").is_some());
        assert!(t.match_target("/x").is_none());
    }

    #[test]
    fn literal_sorts_before_variable_before_tail() {
        let lit = template("/teams/all");
        let var = template("/teams/{name}");
        let tail = template("/teams/*");
        assert!(lit < var);
        assert!(var < tail);
        assert!(lit < tail);
    }

    #[test]
    fn longer_template_sorts_before_its_prefix() {
        let long = template("/teams/{type}/{name}");
        let short = template("/teams/{type}");
        assert!(long < short);
    }

    #[test]
    fn variable_names_do_not_affect_order() {
        assert_eq!(template("/a/{x}").cmp(&template("/a/{y}")), Ordering::Equal);
    }
}
