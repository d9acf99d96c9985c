//! Response envelope and platform response formatting.
//!
//! Handler results and errors all leave the orchestrator through this
//! module: the JSend-derived [`Envelope`] is the JSON body shape, and
//! [`Formatter`] turns envelopes, raw short-circuit responses, and errors
//! into the platform [`HttpResponse`] (status, merged headers, serialized
//! cookies, JSON body).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::HandlerError;
use crate::route::Verb;
use crate::status::status_info;
use crate::validate::ValidationFailure;

/// `SameSite` cookie attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// A response cookie with standard attributes, serialized into a single
/// `Set-Cookie` header value.
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub http_only: bool,
    pub max_age: Option<i64>,
    pub path: Option<String>,
    pub same_site: Option<SameSite>,
    pub secure: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            expires: None,
            http_only: false,
            max_age: None,
            path: None,
            same_site: None,
            secure: false,
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn same_site(mut self, value: SameSite) -> Self {
        self.same_site = Some(value);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Build the `Set-Cookie` header value for this cookie.
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];
        if let Some(domain) = &self.domain {
            parts.push(format!("Domain={domain}"));
        }
        if let Some(expires) = &self.expires {
            parts.push(format!(
                "Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }
        if let Some(path) = &self.path {
            parts.push(format!("Path={path}"));
        }
        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={}", same_site.as_str()));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.join("; ")
    }
}

/// JSend-derived response body: exactly one shape per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Envelope {
    /// Normal completion.
    Success(Value),
    /// Handled 4xx domain failure.
    Fail(FailData),
    /// Input validation failure (always HTTP 400).
    Invalid(InvalidData),
    /// Unhandled 5xx failure.
    Error(ErrorData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailData {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidData {
    pub title: String,
    pub description: String,
    pub messages: Vec<String>,
    pub schema: std::collections::BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub title: String,
    pub description: String,
    pub request_id: String,

    /// Development mode only: the underlying error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Development mode only: the error cause chain, outermost first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Vec<String>>,

    /// Development mode only: where to find the execution logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
}

/// An early or overriding response produced by a short-circuiting hook or
/// the `on_error` hook. Its body bypasses the envelope and is emitted
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<Cookie>,
    pub body: Option<Value>,
}

impl RawResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }
}

/// The platform response shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl HttpResponse {
    /// Deserialize the body back into an [`Envelope`]-shaped JSON value.
    /// Test helper more than production surface.
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Ambient response context contributed by the application: headers and
/// cookies attached to every response unless the handler overrides them.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    pub headers: HashMap<String, String>,
    pub cookies: Vec<Cookie>,
}

/// Builds platform responses; owned by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    pub ambient: ResponseContext,
    pub dev_mode: bool,
    /// Log-lookup URL template; `{requestId}` is substituted.
    pub logs_url: Option<String>,
}

impl Formatter {
    /// Format a normal handler completion as a `success` envelope.
    pub fn success(
        &self,
        status_code: u16,
        data: Value,
        headers: &HashMap<String, String>,
        cookies: &[Cookie],
    ) -> HttpResponse {
        self.envelope(status_code, &Envelope::Success(data), headers, cookies)
    }

    /// Format an envelope with handler-contributed headers and cookies
    /// merged over the ambient ones.
    pub fn envelope(
        &self,
        status_code: u16,
        envelope: &Envelope,
        headers: &HashMap<String, String>,
        cookies: &[Cookie],
    ) -> HttpResponse {
        let mut merged = self.merge_headers(headers);
        merged
            .entry("content-type".to_string())
            .or_insert_with(|| "application/json".to_string());

        HttpResponse {
            status_code,
            headers: merged,
            cookies: self.merge_cookies(cookies),
            body: serde_json::to_string(envelope).unwrap_or_else(|_| "{}".to_string()),
            is_base64_encoded: false,
        }
    }

    /// Emit a short-circuit response verbatim: string bodies pass through
    /// unquoted, other values are serialized as JSON.
    pub fn raw(&self, raw: RawResponse) -> HttpResponse {
        let (body, default_content_type) = match raw.body {
            None => (String::new(), "application/json"),
            Some(Value::String(text)) => (text, "text/plain"),
            Some(value) => (value.to_string(), "application/json"),
        };

        let mut merged = self.merge_headers(&raw.headers);
        if !body.is_empty() {
            merged
                .entry("content-type".to_string())
                .or_insert_with(|| default_content_type.to_string());
        }

        HttpResponse {
            status_code: raw.status_code,
            headers: merged,
            cookies: self.merge_cookies(&raw.cookies),
            body,
            is_base64_encoded: false,
        }
    }

    /// 404 `fail` envelope for an unmatched route, advertising sibling
    /// verbs through `Allow` when any were found.
    pub fn not_found(&self, allowed: &[Verb]) -> HttpResponse {
        let info = status_info(404);
        let mut headers = HashMap::new();
        if !allowed.is_empty() {
            let verbs: Vec<String> = allowed
                .iter()
                .map(|v| v.as_str().to_ascii_uppercase())
                .collect();
            headers.insert("allow".to_string(), verbs.join(", "));
        }
        self.envelope(
            404,
            &Envelope::Fail(FailData {
                title: info.title.to_string(),
                description: info.description.to_string(),
            }),
            &headers,
            &[],
        )
    }

    /// 400 `invalid` envelope for an aggregated validation failure.
    pub fn invalid(&self, failure: ValidationFailure) -> HttpResponse {
        let info = status_info(400);
        self.envelope(
            400,
            &Envelope::Invalid(InvalidData {
                title: info.title.to_string(),
                description: info.description.to_string(),
                messages: failure.messages,
                schema: failure.schema,
            }),
            &HashMap::new(),
            &[],
        )
    }

    /// Default mapper from a raised [`HandlerError`] to a response, used
    /// when no `on_error` hook is configured.
    pub fn default_error(&self, error: &HandlerError, request_id: &str) -> HttpResponse {
        match error {
            HandlerError::Validation(failure) => self.invalid((**failure).clone()),
            HandlerError::Domain { status, message } if *status < 500 => {
                let info = status_info(*status);
                self.envelope(
                    *status,
                    &Envelope::Fail(FailData {
                        title: info.title.to_string(),
                        description: message
                            .clone()
                            .unwrap_or_else(|| info.description.to_string()),
                    }),
                    &HashMap::new(),
                    &[],
                )
            }
            HandlerError::Domain { status, message } => self.error_envelope(
                *status,
                request_id,
                message.clone(),
                None,
            ),
            HandlerError::Unhandled(source) => {
                let cause: Vec<String> = source.chain().skip(1).map(|c| c.to_string()).collect();
                self.error_envelope(
                    500,
                    request_id,
                    Some(source.to_string()),
                    (!cause.is_empty()).then_some(cause),
                )
            }
        }
    }

    fn error_envelope(
        &self,
        status: u16,
        request_id: &str,
        message: Option<String>,
        cause: Option<Vec<String>>,
    ) -> HttpResponse {
        let info = status_info(status);
        let logs = self
            .logs_url
            .as_ref()
            .map(|template| template.replace("{requestId}", request_id));

        self.envelope(
            status,
            &Envelope::Error(ErrorData {
                title: info.title.to_string(),
                description: info.description.to_string(),
                request_id: request_id.to_string(),
                message: if self.dev_mode { message } else { None },
                cause: if self.dev_mode { cause } else { None },
                logs: if self.dev_mode { logs } else { None },
            }),
            &HashMap::new(),
            &[],
        )
    }

    /// Handler-contributed headers win over ambient ones on collision.
    /// Header names are case-insensitive, so both sides are normalized to
    /// lowercase before merging.
    fn merge_headers(&self, overlay: &HashMap<String, String>) -> HashMap<String, String> {
        let mut merged: HashMap<String, String> = self
            .ambient
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        for (name, value) in overlay {
            merged.insert(name.to_ascii_lowercase(), value.clone());
        }
        merged
    }

    /// Handler-contributed cookies win over ambient ones on name collision;
    /// ambient ordering is preserved otherwise.
    fn merge_cookies(&self, overlay: &[Cookie]) -> Vec<String> {
        let mut merged: Vec<Cookie> = self.ambient.cookies.clone();
        for cookie in overlay {
            if let Some(existing) = merged.iter_mut().find(|c| c.name == cookie.name) {
                *existing = cookie.clone();
            } else {
                merged.push(cookie.clone());
            }
        }
        merged.iter().map(Cookie::to_header_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn envelope_serializes_with_status_discriminant() {
        let success = Envelope::Success(json!({ "a": 1 }));
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({ "status": "success", "data": { "a": 1 } })
        );

        let fail = Envelope::Fail(FailData {
            title: "Not Found".to_string(),
            description: "The requested resource could not be found.".to_string(),
        });
        let value = serde_json::to_value(&fail).unwrap();
        assert_eq!(value["status"], "fail");
        assert_eq!(value["data"]["title"], "Not Found");
    }

    #[test]
    fn cookie_builds_all_attributes() {
        let expires = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        let cookie = Cookie::new("session", "abc123")
            .domain("example.com")
            .expires(expires)
            .http_only()
            .max_age(3600)
            .path("/")
            .same_site(SameSite::Lax)
            .secure();

        assert_eq!(
            cookie.to_header_value(),
            "session=abc123; Domain=example.com; Expires=Wed, 02 Jan 2030 03:04:05 GMT; \
             HttpOnly; Max-Age=3600; Path=/; SameSite=Lax; Secure"
        );
    }

    #[test]
    fn minimal_cookie_is_just_the_pair() {
        assert_eq!(Cookie::new("a", "b").to_header_value(), "a=b");
    }

    #[test]
    fn handler_headers_win_over_ambient() {
        let formatter = Formatter {
            ambient: ResponseContext {
                headers: HashMap::from([
                    ("x-served-by".to_string(), "ambient".to_string()),
                    ("x-keep".to_string(), "yes".to_string()),
                ]),
                cookies: vec![Cookie::new("theme", "dark")],
            },
            ..Formatter::default()
        };

        let response = formatter.success(
            200,
            json!(null),
            &HashMap::from([("X-Served-By".to_string(), "handler".to_string())]),
            &[Cookie::new("theme", "light")],
        );

        assert_eq!(response.headers.get("x-served-by").unwrap(), "handler");
        assert_eq!(response.headers.get("x-keep").unwrap(), "yes");
        assert_eq!(response.cookies, vec!["theme=light".to_string()]);
    }

    #[test]
    fn header_precedence_is_case_insensitive() {
        let formatter = Formatter {
            ambient: ResponseContext {
                headers: HashMap::from([("X-Served-By".to_string(), "ambient".to_string())]),
                cookies: Vec::new(),
            },
            ..Formatter::default()
        };

        let response = formatter.success(
            200,
            json!(null),
            &HashMap::from([("x-served-by".to_string(), "handler".to_string())]),
            &[],
        );

        assert_eq!(response.headers.get("x-served-by").unwrap(), "handler");
        assert!(!response.headers.contains_key("X-Served-By"));
    }

    #[test]
    fn raw_string_body_passes_through_unquoted() {
        let formatter = Formatter::default();
        let response = formatter.raw(RawResponse::new(201).body(json!("early")));
        assert_eq!(response.status_code, 201);
        assert_eq!(response.body, "early");
        assert_eq!(response.headers.get("content-type").unwrap(), "text/plain");
    }

    #[test]
    fn not_found_reports_allow_header_when_siblings_exist() {
        let formatter = Formatter::default();
        let response = formatter.not_found(&[Verb::Get, Verb::Post]);
        assert_eq!(response.status_code, 404);
        assert_eq!(response.headers.get("allow").unwrap(), "GET, POST");
        let body = response.body_json().unwrap();
        assert_eq!(body["status"], "fail");
        assert!(body["data"]["description"]
            .as_str()
            .unwrap()
            .contains("not be found"));

        let bare = formatter.not_found(&[]);
        assert!(!bare.headers.contains_key("allow"));
    }

    #[test]
    fn default_mapper_hides_dev_fields_in_production() {
        let formatter = Formatter::default();
        let error = HandlerError::Unhandled(anyhow::anyhow!("boom"));
        let response = formatter.default_error(&error, "req-1");
        let body = response.body_json().unwrap();
        assert_eq!(response.status_code, 500);
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"]["requestId"], "req-1");
        assert!(body["data"].get("message").is_none());
    }

    #[test]
    fn default_mapper_adds_dev_fields_in_dev_mode() {
        let formatter = Formatter {
            dev_mode: true,
            logs_url: Some("https://logs.example.com/{requestId}".to_string()),
            ..Formatter::default()
        };
        let root = anyhow::anyhow!("root cause");
        let error = HandlerError::Unhandled(root.context("outer failure"));
        let response = formatter.default_error(&error, "req-2");
        let body = response.body_json().unwrap();

        assert_eq!(body["data"]["message"], "outer failure");
        assert_eq!(body["data"]["cause"], json!(["root cause"]));
        assert_eq!(body["data"]["logs"], "https://logs.example.com/req-2");
    }

    #[test]
    fn default_mapper_is_idempotent_for_5xx() {
        let formatter = Formatter::default();
        let error = HandlerError::Unhandled(anyhow::anyhow!("boom"));
        let first = formatter.default_error(&error, "req-3");
        let second = formatter.default_error(&error, "req-3");
        assert_eq!(first, second);
    }

    #[test]
    fn domain_4xx_maps_to_fail_with_canonical_title() {
        let formatter = Formatter::default();
        let error = HandlerError::domain_msg(409, "widget already exists");
        let response = formatter.default_error(&error, "req-4");
        let body = response.body_json().unwrap();

        assert_eq!(response.status_code, 409);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["data"]["title"], "Conflict");
        assert_eq!(body["data"]["description"], "widget already exists");
    }

    #[test]
    fn domain_5xx_maps_to_error_shape_keeping_the_code() {
        let formatter = Formatter::default();
        let error = HandlerError::domain(503);
        let response = formatter.default_error(&error, "req-5");
        let body = response.body_json().unwrap();

        assert_eq!(response.status_code, 503);
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"]["title"], "Service Unavailable");
    }
}
