//! Header redaction for request logging.
//!
//! Cookies carry the signed access policy and `Authorization` may carry
//! tokens from the gateway, so those values never reach the logs. Names are
//! compared case-insensitively.

use lambda_http::http::HeaderMap;

/// Header names whose values are replaced before logging.
pub const SENSITIVE_HEADER_NAMES: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
    "x-amz-security-token",
];

const REDACTED: &str = "[REDACTED]";

pub fn is_sensitive(name: &str) -> bool {
    SENSITIVE_HEADER_NAMES
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
}

/// `name: value` pairs safe to log. Non-UTF-8 values are dropped.
pub fn loggable_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str();
            if is_sensitive(name) {
                return Some((name.to_string(), REDACTED.to_string()));
            }
            value
                .to_str()
                .ok()
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect()
}
