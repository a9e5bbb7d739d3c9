//! String-to-typed-value conversion for path and query parameters.
//!
//! Binding slots declare a type by name (`"i64"`, `"bool"`, `"datetime"`,
//! ...); the registry maps those names to converters producing
//! `serde_json::Value`s, so handlers see properly typed numbers and booleans
//! instead of raw strings. The registry is built once, before registration,
//! and injected wherever binding happens; an unregistered name fails with
//! [`TypeConversionError::Unsupported`] rather than falling back to text.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::TypeConversionError;

/// Converts one raw string into a typed JSON value.
pub trait TypeConverter: Send + Sync {
    fn convert(&self, raw: &str) -> Result<Value, TypeConversionError>;
}

impl<F> TypeConverter for F
where
    F: Fn(&str) -> Result<Value, TypeConversionError> + Send + Sync,
{
    fn convert(&self, raw: &str) -> Result<Value, TypeConversionError> {
        self(raw)
    }
}

/// Datetime formats tried in order after RFC 3339, all read as UTC.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only fallback formats, midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

fn invalid(ty: &str, raw: &str) -> TypeConversionError {
    TypeConversionError::Invalid {
        ty: ty.to_string(),
        value: raw.to_string(),
    }
}

fn convert_integer<T>(ty: &'static str, raw: &str) -> Result<Value, TypeConversionError>
where
    T: std::str::FromStr,
    Value: From<T>,
{
    raw.parse::<T>()
        .map(Value::from)
        .map_err(|_| invalid(ty, raw))
}

fn convert_float(ty: &'static str, raw: &str) -> Result<Value, TypeConversionError> {
    let parsed: f64 = raw.parse().map_err(|_| invalid(ty, raw))?;
    if parsed.is_finite() {
        Ok(Value::from(parsed))
    } else {
        Err(invalid(ty, raw))
    }
}

fn convert_bool(raw: &str) -> Result<Value, TypeConversionError> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(Value::Bool(true))
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(Value::Bool(false))
    } else {
        Err(invalid("bool", raw))
    }
}

fn convert_char(raw: &str) -> Result<Value, TypeConversionError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::String(c.to_string())),
        _ => Err(invalid("char", raw)),
    }
}

/// Try RFC 3339 first, then the naive datetime formats, then date-only;
/// the output is always a canonical RFC 3339 string.
fn convert_datetime(raw: &str) -> Result<Value, TypeConversionError> {
    let text = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Value::String(dt.to_rfc3339()));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(Value::String(dt.and_utc().to_rfc3339()));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Value::String(dt.and_utc().to_rfc3339()));
            }
        }
    }
    Err(TypeConversionError::UnparseableDate(raw.to_string()))
}

/// Immutable map from declared type names to converters.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn TypeConverter>>,
}

impl ConverterRegistry {
    /// A registry with no converters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// The default registry: integer widths, floats, `bool`, `char`,
    /// `string`, and the `datetime` cascade.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("i32", Arc::new(|raw: &str| convert_integer::<i32>("i32", raw)));
        registry.register("i64", Arc::new(|raw: &str| convert_integer::<i64>("i64", raw)));
        registry.register("u32", Arc::new(|raw: &str| convert_integer::<u32>("u32", raw)));
        registry.register("u64", Arc::new(|raw: &str| convert_integer::<u64>("u64", raw)));
        registry.register("f32", Arc::new(|raw: &str| convert_float("f32", raw)));
        registry.register("f64", Arc::new(|raw: &str| convert_float("f64", raw)));
        registry.register("bool", Arc::new(|raw: &str| convert_bool(raw)));
        registry.register("char", Arc::new(|raw: &str| convert_char(raw)));
        registry.register("string", Arc::new(|raw: &str| Ok(Value::String(raw.to_string()))));
        registry.register("datetime", Arc::new(|raw: &str| convert_datetime(raw)));
        registry
    }

    /// Add or replace a converter under a type name. Call while assembling
    /// the registry; afterwards it is shared immutably.
    pub fn register(&mut self, ty: impl Into<String>, converter: Arc<dyn TypeConverter>) {
        self.converters.insert(ty.into(), converter);
    }

    #[must_use]
    pub fn contains(&self, ty: &str) -> bool {
        self.converters.contains_key(ty)
    }

    /// Convert `raw` under the converter registered for `ty`.
    pub fn convert(&self, ty: &str, raw: &str) -> Result<Value, TypeConversionError> {
        match self.converters.get(ty) {
            Some(converter) => converter.convert(raw),
            None => Err(TypeConversionError::Unsupported(ty.to_string())),
        }
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("types", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_and_floats_become_numbers() {
        let reg = ConverterRegistry::with_defaults();
        assert_eq!(reg.convert("i32", "42").unwrap(), json!(42));
        assert_eq!(reg.convert("i64", "-7").unwrap(), json!(-7));
        assert_eq!(reg.convert("f64", "2.5").unwrap(), json!(2.5));
        assert!(reg.convert("i32", "forty").is_err());
        assert!(reg.convert("u32", "-1").is_err());
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let reg = ConverterRegistry::with_defaults();
        assert!(reg.convert("f64", "NaN").is_err());
        assert!(reg.convert("f64", "inf").is_err());
    }

    #[test]
    fn bool_is_case_insensitive_but_strict() {
        let reg = ConverterRegistry::with_defaults();
        assert_eq!(reg.convert("bool", "TRUE").unwrap(), json!(true));
        assert_eq!(reg.convert("bool", "false").unwrap(), json!(false));
        assert!(reg.convert("bool", "yes").is_err());
    }

    #[test]
    fn char_requires_exactly_one_character() {
        let reg = ConverterRegistry::with_defaults();
        assert_eq!(reg.convert("char", "x").unwrap(), json!("x"));
        assert!(reg.convert("char", "xy").is_err());
        assert!(reg.convert("char", "").is_err());
    }

    #[test]
    fn datetime_cascade_canonicalizes_to_rfc3339() {
        let reg = ConverterRegistry::with_defaults();
        assert_eq!(
            reg.convert("datetime", "2026-03-01T09:30:00+02:00").unwrap(),
            json!("2026-03-01T09:30:00+02:00")
        );
        assert_eq!(
            reg.convert("datetime", "2026-03-01 09:30:00").unwrap(),
            json!("2026-03-01T09:30:00+00:00")
        );
        assert_eq!(
            reg.convert("datetime", "2026-03-01").unwrap(),
            json!("2026-03-01T00:00:00+00:00")
        );
        assert!(matches!(
            reg.convert("datetime", "March first").unwrap_err(),
            TypeConversionError::UnparseableDate(_)
        ));
    }

    #[test]
    fn unregistered_type_is_unsupported() {
        let reg = ConverterRegistry::with_defaults();
        assert!(matches!(
            reg.convert("uuid", "abc").unwrap_err(),
            TypeConversionError::Unsupported(ty) if ty == "uuid"
        ));
    }

    #[test]
    fn custom_converters_can_be_registered() {
        let mut reg = ConverterRegistry::empty();
        reg.register(
            "upper",
            Arc::new(|raw: &str| Ok(Value::String(raw.to_ascii_uppercase()))),
        );
        assert_eq!(reg.convert("upper", "cubs").unwrap(), json!("CUBS"));
    }
}
