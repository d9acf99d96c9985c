//! API Gateway HTTP API (payload v2) event parsing.
//!
//! Converts the raw JSON event Lambda delivers into an orchestrator
//! [`Invocation`]. The hot-trigger marker is checked before any shape
//! parsing so keep-warm pings never need to look like HTTP requests.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use handlerkit::{is_hot_function_trigger, is_safe_key, Invocation, Request, RequestContext};

/// The inbound event could not be parsed as an HTTP API v2 payload.
#[derive(Debug, thiserror::Error)]
#[error("failed to parse API Gateway event: {source}")]
pub struct EventError {
    #[from]
    source: serde_json::Error,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpApiEvent {
    #[serde(default)]
    raw_path: String,
    #[serde(default)]
    cookies: Vec<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    query_string_parameters: HashMap<String, String>,
    #[serde(default)]
    request_context: EventRequestContext,
    body: Option<String>,
    #[serde(default)]
    is_base64_encoded: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRequestContext {
    #[serde(default)]
    request_id: String,
    time_epoch: Option<i64>,
    #[serde(default)]
    http: EventHttp,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventHttp {
    #[serde(default)]
    method: String,
    #[serde(default)]
    path: String,
    source_ip: Option<String>,
}

/// Parse a raw Lambda payload into an [`Invocation`].
///
/// `lambda_request_id` comes from the Lambda invocation context and
/// backfills the request id when the payload carries none (direct
/// invocations, test events).
pub fn parse_invocation(payload: Value, lambda_request_id: &str) -> Result<Invocation, EventError> {
    if is_hot_function_trigger(&payload) {
        return Ok(Invocation::HotFunctionTrigger);
    }

    let event: HttpApiEvent = serde_json::from_value(payload)?;

    let headers: HashMap<String, String> = event
        .headers
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect();
    let trace_id = headers.get("x-amzn-trace-id").cloned();

    // Cookie entries without a `=` or with a reserved name are dropped at
    // this boundary rather than rejected.
    let cookies: HashMap<String, String> = event
        .cookies
        .iter()
        .filter_map(|entry| entry.split_once('='))
        .filter(|(name, _)| is_safe_key(name))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let raw_path = if event.raw_path.is_empty() {
        event.request_context.http.path.clone()
    } else {
        event.raw_path
    };
    let request_id = if event.request_context.request_id.is_empty() {
        lambda_request_id.to_string()
    } else {
        event.request_context.request_id
    };

    Ok(Invocation::Request(Request {
        raw_path,
        method: event.request_context.http.method.to_ascii_lowercase(),
        headers,
        query: event.query_string_parameters,
        cookies,
        body: event.body,
        is_base64_encoded: event.is_base64_encoded,
        context: RequestContext {
            request_id,
            trace_id,
            source_ip: event.request_context.http.source_ip,
            time_epoch_ms: event.request_context.time_epoch,
        },
    }))
}
