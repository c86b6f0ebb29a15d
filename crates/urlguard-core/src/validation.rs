//! Request validation and URL canonicalization
//!
//! Every prediction starts here: the raw payload is coerced into a
//! [`PredictRequest`], and its URL is checked against the scheme, host and
//! length constraints before being rewritten into canonical form.

use crate::error::{Error, Result};
use crate::url_parts::split_url;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use url::Url;

/// Schemes a URL may use
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Maximum accepted URL length in characters
pub const MAX_URL_LENGTH: usize = 2048;

/// Epoch values above this are interpreted as milliseconds
const EPOCH_MILLIS_CUTOFF: f64 = 2e10;

/// Prediction request as received from a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// URL to evaluate
    #[serde(rename = "check_url", alias = "url")]
    pub url: String,

    /// Client-side time of the check
    #[serde(
        default = "default_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: DateTime<Utc>,
}

impl PredictRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Raw shapes a prediction payload may arrive in
#[derive(Debug, Clone)]
pub enum Payload {
    /// Already-typed request
    Request(PredictRequest),
    /// Bare URL string
    Url(String),
    /// Generic key/value mapping (e.g. a decoded JSON body)
    Mapping(serde_json::Value),
}

impl From<PredictRequest> for Payload {
    fn from(request: PredictRequest) -> Self {
        Self::Request(request)
    }
}

impl From<String> for Payload {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<&str> for Payload {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Mapping(value)
    }
}

/// A URL that passed validation and was rewritten into canonical form.
///
/// Only [`normalize_url`] constructs these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate and normalize an incoming payload before inference.
///
/// Returns the request with its URL replaced by the canonical string.
pub fn validate_request(payload: impl Into<Payload>) -> Result<PredictRequest> {
    let mut request = parse_request(payload)?;
    let canonical = normalize_url(&request.url)?;
    request.url = canonical.into_string();
    Ok(request)
}

/// Coerce a payload into a request without touching its URL
pub fn parse_request(payload: impl Into<Payload>) -> Result<PredictRequest> {
    match payload.into() {
        Payload::Request(request) => Ok(request),
        Payload::Url(url) => Ok(PredictRequest::new(url)),
        Payload::Mapping(serde_json::Value::String(url)) => Ok(PredictRequest::new(url)),
        Payload::Mapping(value @ serde_json::Value::Object(_)) => {
            serde_json::from_value(value).map_err(|e| Error::validation(e.to_string()))
        }
        Payload::Mapping(_) => Err(Error::validation(
            "Unsupported payload type for validation",
        )),
    }
}

/// Check a raw URL and rewrite it into canonical form.
///
/// The scheme is lowercased, the fragment and the last segment's `;params`
/// are dropped and the query is trimmed of surrounding whitespace. The
/// authority and path are kept exactly as written. Normalizing a canonical
/// URL returns it unchanged.
pub fn normalize_url(raw_url: &str) -> Result<CanonicalUrl> {
    if raw_url.trim().is_empty() {
        return Err(Error::validation("URL is required"));
    }
    if raw_url.chars().count() > MAX_URL_LENGTH {
        return Err(Error::validation("URL exceeds maximum length"));
    }

    let trimmed = raw_url.trim();
    let parts = split_url(trimmed)
        .filter(|parts| ALLOWED_SCHEMES.contains(&parts.scheme.to_ascii_lowercase().as_str()))
        .ok_or_else(|| Error::validation("Only HTTP/HTTPS URLs are allowed"))?;

    if parts.host().is_empty() {
        return Err(Error::validation("URL missing host component"));
    }

    let mut canonical = format!(
        "{}://{}{}",
        parts.scheme.to_ascii_lowercase(),
        parts.authority,
        parts.path_without_params()
    );
    if let Some(query) = parts.query.map(str::trim).filter(|q| !q.is_empty()) {
        canonical.push('?');
        canonical.push_str(query);
    }

    // Only checked for well-formedness; its serialization is not used
    Url::parse(&canonical).map_err(|e| match e {
        url::ParseError::EmptyHost => Error::validation("URL missing host component"),
        other => Error::validation(format!("Invalid URL: {}", other)),
    })?;

    tracing::trace!(url = %canonical, "normalized url");
    Ok(CanonicalUrl(canonical))
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Accepts RFC 3339 strings or Unix epoch numbers (seconds or milliseconds)
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Epoch(f64),
        Text(String),
    }

    let parsed = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Epoch(value) => from_epoch(value),
        RawTimestamp::Text(text) => match text.trim().parse::<f64>() {
            Ok(value) => from_epoch(value),
            Err(_) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        },
    };

    parsed.ok_or_else(|| serde::de::Error::custom("invalid timestamp"))
}

fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() > EPOCH_MILLIS_CUTOFF {
        value
    } else {
        value * 1000.0
    };
    DateTime::<Utc>::from_timestamp_millis(millis.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(err: Error) -> String {
        match err {
            Error::RequestValidation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_query_whitespace_trimmed() {
        let url = normalize_url("https://example.com/login?x= ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/login?x=");
    }

    #[test]
    fn test_fragment_and_params_removed() {
        let url = normalize_url("https://example.com/a/b;type=x?q=1#section").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a/b?q=1");
    }

    #[test]
    fn test_query_whitespace_before_fragment_trimmed() {
        let url = normalize_url("http://example.com/p? a=1 #frag").unwrap();
        assert_eq!(url.as_str(), "http://example.com/p?a=1");
    }

    #[test]
    fn test_empty_query_dropped() {
        let url = normalize_url("https://example.com/?   ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let url = normalize_url("HTTPS://Example.COM/Path").unwrap();
        assert_eq!(url.as_str(), "https://Example.COM/Path");
    }

    #[test]
    fn test_numeric_hosts_kept_as_written() {
        let url = normalize_url("http://3232235521/login").unwrap();
        assert_eq!(url.as_str(), "http://3232235521/login");

        let url = normalize_url("http://0x7f.1/admin").unwrap();
        assert_eq!(url.as_str(), "http://0x7f.1/admin");
    }

    #[test]
    fn test_idn_host_not_punycoded() {
        let url = normalize_url("http://аpple.com/login").unwrap();
        assert_eq!(url.as_str(), "http://аpple.com/login");
    }

    #[test]
    fn test_dot_segments_kept() {
        let url = normalize_url("https://example.com/a b/../c").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a b/../c");
    }

    #[test]
    fn test_userinfo_and_port_kept() {
        let url = normalize_url("http://user@Example.com:8080/x;p#f").unwrap();
        assert_eq!(url.as_str(), "http://user@Example.com:8080/x");
    }

    #[test]
    fn test_backslash_authority_rejected() {
        let err = normalize_url("http:\\\\evil.com\\x").unwrap_err();
        assert_eq!(message(err), "URL missing host component");
    }

    #[test]
    fn test_port_without_host_rejected() {
        let err = normalize_url("http://:80/").unwrap_err();
        assert_eq!(message(err), "URL missing host component");
    }

    #[test]
    fn test_malformed_authority_rejected() {
        let err = normalize_url("http://[::1/").unwrap_err();
        assert!(message(err).starts_with("Invalid URL"));
    }

    #[test]
    fn test_ftp_rejected() {
        let err = normalize_url("ftp://example.com").unwrap_err();
        assert_eq!(message(err), "Only HTTP/HTTPS URLs are allowed");
    }

    #[test]
    fn test_missing_scheme_rejected() {
        let err = normalize_url("example.com/login").unwrap_err();
        assert_eq!(message(err), "Only HTTP/HTTPS URLs are allowed");
    }

    #[test]
    fn test_missing_host_rejected() {
        let err = normalize_url("http://").unwrap_err();
        assert_eq!(message(err), "URL missing host component");
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(message(normalize_url("").unwrap_err()), "URL is required");
        assert_eq!(message(normalize_url("   ").unwrap_err()), "URL is required");
    }

    #[test]
    fn test_too_long_rejected() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(message(normalize_url(&url).unwrap_err()), "URL exceeds maximum length");

        let exact = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH - 20));
        assert_eq!(exact.len(), MAX_URL_LENGTH);
        assert!(normalize_url(&exact).is_ok());
    }

    #[test]
    fn test_canonical_is_idempotent() {
        let once = normalize_url("https://example.com/login?x= ").unwrap();
        let twice = normalize_url(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validate_bare_string() {
        let request = validate_request("https://example.com/login?x= ").unwrap();
        assert_eq!(request.url, "https://example.com/login?x=");
    }

    #[test]
    fn test_validate_typed_request_keeps_timestamp() {
        let original = PredictRequest::new("http://example.com#top");
        let timestamp = original.timestamp;
        let request = validate_request(original).unwrap();
        assert_eq!(request.url, "http://example.com");
        assert_eq!(request.timestamp, timestamp);
    }

    #[test]
    fn test_validate_mapping_with_alias() {
        let request = validate_request(json!({
            "check_url": "https://example.com/a",
            "timestamp": 1_700_000_000_000i64
        }))
        .unwrap();
        assert_eq!(request.url, "https://example.com/a");
        assert_eq!(request.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_validate_mapping_epoch_seconds_and_rfc3339() {
        let secs = validate_request(json!({"check_url": "https://a.com", "timestamp": 1_700_000_000}))
            .unwrap();
        assert_eq!(secs.timestamp.timestamp(), 1_700_000_000);

        let text = validate_request(json!({
            "check_url": "https://a.com",
            "timestamp": "2024-01-02T03:04:05Z"
        }))
        .unwrap();
        assert_eq!(text.timestamp.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn test_validate_mapping_missing_url() {
        let err = validate_request(json!({"timestamp": 1})).unwrap_err();
        assert!(message(err).contains("check_url"));
    }

    #[test]
    fn test_parse_request_keeps_raw_url() {
        let request = parse_request(json!({"url": " HTTP://Example.com/a#b "})).unwrap();
        assert_eq!(request.url, " HTTP://Example.com/a#b ");
    }

    #[test]
    fn test_validate_unsupported_shape() {
        let err = validate_request(json!([1, 2, 3])).unwrap_err();
        assert_eq!(message(err), "Unsupported payload type for validation");
    }
}
