//! Test utilities for Lambda handler testing.
//!
//! Provides an API Gateway HTTP API v2 event builder and a hot-trigger
//! payload so handler tests can drive the full parse-and-execute path
//! without a deployed gateway. Only available in test builds, or to
//! dependent crates through the `test-utils` feature.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use handlerkit::HOT_FUNCTION_TRIGGER_KEY;

/// Build the keep-warm payload the scheduler sends.
pub fn hot_trigger_event() -> Value {
    json!({ HOT_FUNCTION_TRIGGER_KEY: true })
}

/// Create a mock request ID for testing.
pub fn mock_request_id(suffix: &str) -> String {
    format!("test-request-{suffix}")
}

/// Builder for API Gateway HTTP API v2 event payloads.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    cookies: Vec<String>,
    body: Option<String>,
    is_base64_encoded: bool,
    request_id: String,
    source_ip: Option<String>,
    time_epoch: Option<i64>,
}

impl EventBuilder {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            query: HashMap::new(),
            cookies: Vec::new(),
            body: None,
            is_base64_encoded: false,
            request_id: "test-request-id".to_string(),
            source_ip: None,
            time_epoch: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add a cookie as a `name=value` pair.
    pub fn cookie(self, name: &str, value: &str) -> Self {
        self.raw_cookie(format!("{name}={value}"))
    }

    /// Add a raw cookie entry exactly as the gateway would deliver it.
    pub fn raw_cookie(mut self, entry: impl Into<String>) -> Self {
        self.cookies.push(entry.into());
        self
    }

    /// Set a JSON body, serialized to the wire string.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// Set a raw body string, optionally flagged as base64.
    pub fn raw_body(mut self, body: impl Into<String>, is_base64_encoded: bool) -> Self {
        self.body = Some(body.into());
        self.is_base64_encoded = is_base64_encoded;
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }

    pub fn time_epoch(mut self, epoch_ms: i64) -> Self {
        self.time_epoch = Some(epoch_ms);
        self
    }

    /// Assemble the payload JSON.
    pub fn build(self) -> Value {
        let mut http = Map::new();
        http.insert("method".to_string(), json!(self.method));
        http.insert("path".to_string(), json!(self.path));
        if let Some(ip) = &self.source_ip {
            http.insert("sourceIp".to_string(), json!(ip));
        }

        let mut request_context = Map::new();
        request_context.insert("requestId".to_string(), json!(self.request_id));
        request_context.insert("http".to_string(), Value::Object(http));
        if let Some(epoch) = self.time_epoch {
            request_context.insert("timeEpoch".to_string(), json!(epoch));
        }

        let mut event = Map::new();
        event.insert("version".to_string(), json!("2.0"));
        event.insert("rawPath".to_string(), json!(self.path));
        event.insert("headers".to_string(), json!(self.headers));
        event.insert(
            "queryStringParameters".to_string(),
            json!(self.query),
        );
        event.insert("cookies".to_string(), json!(self.cookies));
        event.insert(
            "requestContext".to_string(),
            Value::Object(request_context),
        );
        if let Some(body) = self.body {
            event.insert("body".to_string(), json!(body));
        }
        event.insert(
            "isBase64Encoded".to_string(),
            json!(self.is_base64_encoded),
        );
        Value::Object(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_a_v2_shaped_event() {
        let event = EventBuilder::new("GET", "/widgets")
            .header("accept", "application/json")
            .query("page", "1")
            .cookie("session", "abc")
            .build();

        assert_eq!(event["version"], "2.0");
        assert_eq!(event["rawPath"], "/widgets");
        assert_eq!(event["requestContext"]["http"]["method"], "GET");
        assert_eq!(event["cookies"], json!(["session=abc"]));
        assert_eq!(event["queryStringParameters"]["page"], "1");
    }

    #[test]
    fn mock_request_id_formats_correctly() {
        assert_eq!(mock_request_id("123"), "test-request-123");
    }
}
