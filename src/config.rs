//! # Configuration Module
//!
//! Environment-variable configuration for the routing service.
//!
//! ## Environment Variables
//!
//! ### `TYPEROUTE_PATH_PREFIX`
//!
//! Prefix joined ahead of every registered resource path (e.g. `/api/v1`).
//! Default: empty.
//!
//! ### `TYPEROUTE_EXPOSE_ENDPOINTS`
//!
//! When `1` or `true` (case-insensitive), registration appends a
//! `GET {prefix}/endpoints` route serving the JSON route catalog.
//! Default: disabled.
//!
//! ### `TYPEROUTE_MAX_BODY_BYTES`
//!
//! Upper bound on request body size before deserialization fails with a
//! 413. Accepts values in:
//! - Decimal: `1048576` (1 MB)
//! - Hexadecimal: `0x100000` (1 MB)
//!
//! `0` disables the cap. Default: no cap.
//!
//! ## Usage
//!
//! ```rust
//! use typeroute::config::RouterConfig;
//!
//! let config = RouterConfig::from_env();
//! println!("prefix: {:?}", config.path_prefix);
//! ```
//!
//! ## Example Configuration
//!
//! ```bash
//! export TYPEROUTE_PATH_PREFIX=/api/v1
//! export TYPEROUTE_EXPOSE_ENDPOINTS=true
//! export TYPEROUTE_MAX_BODY_BYTES=0x100000
//! ```

use std::env;

/// Service-level routing configuration.
///
/// Load at startup with [`RouterConfig::from_env()`], or build directly
/// when embedding.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    /// Prefix joined ahead of every registered resource path.
    pub path_prefix: String,
    /// Whether to register the endpoint-catalog route.
    pub expose_endpoints: bool,
    /// Request body cap in bytes; `None` leaves bodies uncapped.
    pub max_body_bytes: Option<usize>,
}

fn parse_size(value: &str) -> Option<usize> {
    let parsed = if let Some(hex) = value.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    };
    match parsed {
        Some(0) | None => None,
        Some(n) => Some(n),
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl RouterConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let path_prefix = env::var("TYPEROUTE_PATH_PREFIX").unwrap_or_default();
        let expose_endpoints = env::var("TYPEROUTE_EXPOSE_ENDPOINTS")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let max_body_bytes = env::var("TYPEROUTE_MAX_BODY_BYTES")
            .ok()
            .and_then(|v| parse_size(&v));
        RouterConfig {
            path_prefix,
            expose_endpoints,
            max_body_bytes,
        }
    }
}
