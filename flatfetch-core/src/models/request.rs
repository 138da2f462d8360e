//! HTTP request envelope and its canonical fingerprint.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use ring::digest;
use serde_json::Value;

use super::method::HttpMethod;

/// Default request weight against the rate budget.
pub const DEFAULT_WEIGHT: u32 = 1;

// ============================================================================
// HTTP Request
// ============================================================================

/// An HTTP request envelope, immutable once built.
///
/// Construct via [`HttpRequest::get`], [`HttpRequest::post`], or
/// [`HttpRequest::delete`] and the consuming `with_*` builders.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    url: String,
    method: HttpMethod,
    params: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    timeout: Option<Duration>,
    body: Option<String>,
    json: Option<Value>,
    weight: u32,
}

impl HttpRequest {
    /// Creates a request with the given method and URL.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            timeout: None,
            body: None,
            json: None,
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Creates a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Adds a header. Names are lowercased.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the wire-call timeout. Bounds only the network call, never the
    /// throttle wait.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets a raw request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON request body.
    #[must_use]
    pub fn with_json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }

    /// Sets the request weight against the rate budget (minimum 1).
    #[must_use]
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight.max(1);
        self
    }

    /// Request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Query parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Headers (lowercased names).
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Cookies.
    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// Wire-call timeout, if set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Raw body, if set.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// JSON body, if set.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Request weight against the rate budget.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Returns a stable identity hash for this request.
    ///
    /// SHA-256 over the canonical string form of (url, params, headers,
    /// body, json body). Map keys are sorted before encoding, so equal
    /// logical requests hash identically regardless of field insertion
    /// order. Absent fields encode as the empty string; an explicit empty
    /// value is therefore indistinguishable from a missing one, and callers
    /// that care must pre-normalize.
    ///
    /// Exposed as a cache/dedup key hook; no cache lives here.
    pub fn fingerprint(&self) -> String {
        let mut canonical = String::new();
        canonical.push_str(&self.url);
        encode_string_map(&self.params, &mut canonical);
        encode_string_map(&self.headers, &mut canonical);
        if let Some(body) = &self.body {
            canonical.push_str(body);
        }
        if let Some(json) = &self.json {
            encode_canonical(json, &mut canonical);
        }

        let digest = digest::digest(&digest::SHA256, canonical.as_bytes());
        digest.as_ref().iter().fold(
            String::with_capacity(digest.as_ref().len() * 2),
            |mut hex, byte| {
                let _ = write!(hex, "{byte:02x}");
                hex
            },
        )
    }
}

// ============================================================================
// Canonical Encoding
// ============================================================================

/// Encodes a string map as JSON; an empty map encodes as the empty string.
///
/// `BTreeMap` iterates in key order, so the encoding is already canonical.
fn encode_string_map(map: &BTreeMap<String, String>, out: &mut String) {
    if map.is_empty() {
        return;
    }

    out.push('{');
    for (index, (key, value)) in map.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        out.push_str(&Value::String(value.clone()).to_string());
    }
    out.push('}');
}

/// Encodes a JSON value with recursively sorted object keys.
///
/// `serde_json`'s map preserves insertion order in this workspace, so plain
/// serialization would not be canonical.
fn encode_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            for (index, key) in keys.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                encode_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                encode_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let request = HttpRequest::get("https://api.example.test/v1/ticker");

        assert_eq!(request.method(), HttpMethod::Get);
        assert_eq!(request.weight(), DEFAULT_WEIGHT);
        assert!(request.params().is_empty());
        assert!(request.body().is_none());
        assert!(request.timeout().is_none());
    }

    #[test]
    fn test_weight_floor_is_one() {
        let request = HttpRequest::get("https://api.example.test").with_weight(0);
        assert_eq!(request.weight(), 1);
    }

    #[test]
    fn test_fingerprint_ignores_insertion_order() {
        let first = HttpRequest::get("https://api.example.test/v1/ticker")
            .with_param("symbol", "BTCUSD")
            .with_param("limit", "10")
            .with_header("x-api-key", "k");
        let second = HttpRequest::get("https://api.example.test/v1/ticker")
            .with_header("x-api-key", "k")
            .with_param("limit", "10")
            .with_param("symbol", "BTCUSD");

        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_fingerprint_sorts_json_body_keys() {
        let first = HttpRequest::post("https://api.example.test")
            .with_json(json!({"b": 1, "a": {"d": 2, "c": 3}}));
        let second = HttpRequest::post("https://api.example.test")
            .with_json(json!({"a": {"c": 3, "d": 2}, "b": 1}));

        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_fingerprint_differs_on_params() {
        let first = HttpRequest::get("https://api.example.test").with_param("symbol", "BTCUSD");
        let second = HttpRequest::get("https://api.example.test").with_param("symbol", "ETHUSD");

        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let fingerprint = HttpRequest::get("https://api.example.test").fingerprint();

        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            fingerprint,
            HttpRequest::get("https://api.example.test").fingerprint()
        );
    }
}
