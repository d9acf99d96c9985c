//! Inbound event snapshot.
//!
//! A [`Request`] is the already-parsed representation of one inbound call:
//! path, verb, headers, query string, cookies, body, and platform metadata.
//! It is built once by the hosting adapter and treated as read-only by the
//! resolver and orchestrator.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HandlerError;

/// Reserved marker key signalling a keep-warm invocation instead of a
/// normal request.
pub const HOT_FUNCTION_TRIGGER_KEY: &str = "__HOT_FUNCTION_TRIGGER__";

/// Returns `true` when the raw event payload carries the hot-trigger
/// marker key.
pub fn is_hot_function_trigger(event: &Value) -> bool {
    event
        .as_object()
        .is_some_and(|map| map.contains_key(HOT_FUNCTION_TRIGGER_KEY))
}

/// Platform metadata attached to a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Platform-assigned request identifier.
    pub request_id: String,

    /// Distributed trace identifier, when the platform provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Source IP of the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,

    /// Epoch milliseconds at which the platform received the request.
    /// Used to derive client-perceived latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_epoch_ms: Option<i64>,
}

/// Immutable snapshot of one inbound call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Raw request path, e.g. `/widgets/123`.
    pub raw_path: String,

    /// Lowercase HTTP verb, e.g. `get`.
    pub method: String,

    /// Header map with lowercase names.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Decoded query string parameters.
    #[serde(default)]
    pub query: HashMap<String, String>,

    /// Cookie name/value pairs.
    #[serde(default)]
    pub cookies: HashMap<String, String>,

    /// Raw request body, possibly base64-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Whether `body` is base64-encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,

    /// Platform request metadata.
    #[serde(default)]
    pub context: RequestContext,
}

impl Request {
    /// Look up a header by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        let lowered = name.to_ascii_lowercase();
        self.headers.get(&lowered).map(String::as_str).or_else(|| {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    /// Decode the body into JSON, handling base64 encoding.
    ///
    /// Returns `Ok(None)` when no body is present. Decode failures are
    /// reported as values so the validator can turn them into a 400
    /// rather than an internal error.
    pub fn json_body(&self) -> Result<Option<Value>, BodyError> {
        let Some(raw) = self.body.as_deref() else {
            return Ok(None);
        };

        let decoded;
        let text = if self.is_base64_encoded {
            let bytes = BASE64.decode(raw).map_err(|_| BodyError::Base64)?;
            decoded = String::from_utf8(bytes).map_err(|_| BodyError::Utf8)?;
            decoded.as_str()
        } else {
            raw
        };

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(text)
            .map(Some)
            .map_err(|_| BodyError::Json)
    }
}

/// Why a request body could not be decoded into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyError {
    Base64,
    Utf8,
    Json,
}

impl BodyError {
    /// Validator-facing message for this decode failure.
    pub fn message(self) -> &'static str {
        match self {
            BodyError::Base64 => "Request body is not valid base64.",
            BodyError::Utf8 => "Request body is not valid UTF-8.",
            BodyError::Json => "Request body is not valid JSON.",
        }
    }
}

/// Orchestrator input: either a keep-warm signal or a real request.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Keep-warm invocation carrying no request.
    HotFunctionTrigger,
    /// A normal inbound request.
    Request(Request),
}

impl From<Request> for Invocation {
    fn from(request: Request) -> Self {
        Invocation::Request(request)
    }
}

impl From<BodyError> for HandlerError {
    fn from(err: BodyError) -> Self {
        HandlerError::domain_msg(400, err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_hot_trigger_marker() {
        assert!(is_hot_function_trigger(
            &json!({ HOT_FUNCTION_TRIGGER_KEY: true })
        ));
        assert!(!is_hot_function_trigger(&json!({ "rawPath": "/" })));
        assert!(!is_hot_function_trigger(&json!(null)));
    }

    #[test]
    fn json_body_plain() {
        let request = Request {
            body: Some(r#"{"a":1}"#.to_string()),
            ..Request::default()
        };
        assert_eq!(request.json_body().unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn json_body_base64() {
        let request = Request {
            body: Some(BASE64.encode(r#"{"a":1}"#)),
            is_base64_encoded: true,
            ..Request::default()
        };
        assert_eq!(request.json_body().unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn json_body_absent_or_blank() {
        assert_eq!(Request::default().json_body().unwrap(), None);
        let request = Request {
            body: Some("   ".to_string()),
            ..Request::default()
        };
        assert_eq!(request.json_body().unwrap(), None);
    }

    #[test]
    fn json_body_decode_failures_are_values() {
        let request = Request {
            body: Some("not json".to_string()),
            ..Request::default()
        };
        assert_eq!(request.json_body(), Err(BodyError::Json));

        let request = Request {
            body: Some("!!!".to_string()),
            is_base64_encoded: true,
            ..Request::default()
        };
        assert_eq!(request.json_body(), Err(BodyError::Base64));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), "abc".to_string());
        let request = Request {
            headers,
            ..Request::default()
        };
        assert_eq!(request.header("X-Request-ID"), Some("abc"));
        assert_eq!(request.header("missing"), None);
    }
}
