//! Error classification logic
//!
//! The only place in the crate that looks at raw status codes, transport
//! failures and JSON error bodies. Rules, in priority order:
//!
//! 1. transport failure before any byte → `Network`
//! 2. 401 / 403 → `Auth`
//! 3. 429, or an error body that reports rate limiting → `RateLimit`
//! 4. 5xx → `Server`
//! 5. any other rejection → `Api`
//!
//! Malformed success bodies are turned into `Validation` errors by the
//! response validator.

use crate::protocol::ProtocolConfig;
use crate::transport::TransportError;
use crate::{Error, ErrorContext};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(crate) fn classify_transport(err: &TransportError) -> Error {
    let source = match err {
        TransportError::Timeout(_) => "attempt_timeout",
        TransportError::Connect(_) => "connect",
        TransportError::Reset(_) => "connection_reset",
        TransportError::Http(e) if e.is_timeout() => "attempt_timeout",
        _ => "transport",
    };
    Error::network(err.to_string(), ErrorContext::new().with_source(source))
}

/// Classify a non-success HTTP response.
pub(crate) fn classify_status(
    status: u16,
    headers: &HeaderMap,
    body: &[u8],
    protocol: &ProtocolConfig,
) -> Error {
    let json: Option<Value> = serde_json::from_slice(body).ok();
    let error_obj = json.as_ref().and_then(|j| j.get("error"));
    let message = error_obj
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                format!("HTTP {}", status)
            } else {
                text
            }
        });

    let mut context = ErrorContext::new()
        .with_status_code(status)
        .with_source("error_classifier");
    if let Some(upstream) = header_first(headers, &protocol.request_id_headers) {
        context = context.with_details(format!("upstream_id: {}", upstream));
    }
    if let Some(code) = error_obj.and_then(error_code_string) {
        context = context.with_field_path(format!("error.code={}", code));
    }

    match status {
        401 | 403 => Error::auth(message, context),
        _ if status == 429 || error_obj.map(is_rate_limit_body).unwrap_or(false) => {
            let retry_after = retry_after_from_headers(headers, protocol)
                .or_else(|| error_obj.and_then(retry_after_from_body));
            Error::rate_limit(message, retry_after, context)
        }
        500..=599 => Error::server(message, context),
        _ => Error::api(message, context),
    }
}

/// Classify an `error` object found inside a body that came with a success status
/// (or mid-stream, inside an SSE event).
pub(crate) fn classify_error_body(error_obj: &Value, status: Option<u16>) -> Error {
    let message = error_obj
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("gateway reported an error")
        .to_string();
    let embedded = error_obj
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|c| u16::try_from(c).ok());
    let effective = embedded.or(status);

    let mut context = ErrorContext::new().with_source("error_body");
    if let Some(s) = effective {
        context = context.with_status_code(s);
    }

    match effective {
        Some(401) | Some(403) => Error::auth(message, context),
        _ if effective == Some(429) || is_rate_limit_body(error_obj) => {
            Error::rate_limit(message, retry_after_from_body(error_obj), context)
        }
        Some(500..=599) => Error::server(message, context),
        _ => Error::api(message, context),
    }
}

fn error_code_string(error_obj: &Value) -> Option<String> {
    match error_obj.get("code")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_rate_limit_body(error_obj: &Value) -> bool {
    if error_obj.get("code").and_then(Value::as_u64) == Some(429) {
        return true;
    }
    ["code", "type"].iter().any(|k| {
        error_obj
            .get(*k)
            .and_then(Value::as_str)
            .map(|s| {
                let s = s.to_ascii_lowercase();
                s.contains("rate_limit") || s.contains("rate limit") || s == "too_many_requests"
            })
            .unwrap_or(false)
    })
}

fn retry_after_from_body(error_obj: &Value) -> Option<Duration> {
    error_obj
        .get("metadata")
        .and_then(|m| m.get("retry_after"))
        .or_else(|| error_obj.get("retry_after"))
        .and_then(Value::as_f64)
        .and_then(seconds)
}

/// Best-effort parsing of rate-limit hints.
///
/// Relative headers (`Retry-After`) are read as seconds; reset headers may be an
/// epoch timestamp in seconds or milliseconds, or a relative number of seconds.
pub(crate) fn retry_after_from_headers(headers: &HeaderMap, protocol: &ProtocolConfig) -> Option<Duration> {
    if let Some(raw) = header_first(headers, &protocol.retry_after_headers) {
        if let Some(d) = raw.parse::<f64>().ok().and_then(seconds) {
            return Some(d);
        }
    }

    let raw = header_first(headers, &protocol.rate_limit_reset_headers)?;
    let val: u64 = raw.parse().ok()?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    if val > 1_000_000_000_000 {
        Some(Duration::from_millis(val).saturating_sub(now))
    } else if val > 1_000_000_000 {
        Some(Duration::from_secs(val).saturating_sub(now))
    } else {
        Some(Duration::from_secs(val))
    }
}

/// Extract the first matching header value from a list of header names.
pub(crate) fn header_first(headers: &HeaderMap, names: &[String]) -> Option<String> {
    for name in names {
        if let Some(v) = headers.get(name.as_str()) {
            if let Ok(s) = v.to_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

fn seconds(v: f64) -> Option<Duration> {
    if v.is_finite() && v >= 0.0 {
        Some(Duration::from_secs_f64(v))
    } else {
        None
    }
}
