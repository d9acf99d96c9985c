//! Request validation against a declared [`Schema`].
//!
//! Every declared section is validated independently; failures are
//! aggregated into one ordered message list rather than short-circuiting at
//! the first bad section. The caller also receives a flattened
//! expected-shape description for every declared section, so a single 400
//! tells them both what was wrong and what shape was expected.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::HandlerExecuteError;
use crate::request::Request;
use crate::schema::{flatten_object, flatten_tuple, FieldKind, FieldSpec, ObjectSchema, Schema};

/// A request section that can carry a schema declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Body,
    Headers,
    Cookies,
    Query,
    PathParams,
}

impl Section {
    /// Wire-facing section key.
    pub fn key(self) -> &'static str {
        match self {
            Section::Body => "body",
            Section::Headers => "headers",
            Section::Cookies => "cookies",
            Section::Query => "queryStringParameters",
            Section::PathParams => "pathParameters",
        }
    }

    fn no_input_message(self) -> String {
        format!("No input was provided for `{}`.", self.key())
    }
}

/// Aggregated validation failure for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// Ordered human-readable failure messages, grouped by section in
    /// declaration order (body, headers, cookies, query, path parameters).
    pub messages: Vec<String>,

    /// Flattened expected shape for every declared section, failing or not.
    pub schema: BTreeMap<String, Vec<String>>,
}

/// Validated input passed to the inner handler: one entry per declared
/// section, each containing only the keys its schema declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Validated {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<HashMap<String, String>>,

    #[serde(
        rename = "queryStringParameters",
        skip_serializing_if = "Option::is_none"
    )]
    pub query: Option<HashMap<String, String>>,

    #[serde(rename = "pathParameters", skip_serializing_if = "Option::is_none")]
    pub path_params: Option<Vec<Option<String>>>,
}

/// Outcome of running the validator: caller input mistakes are values, a
/// schema that cannot validate its section is an author mistake and fatal.
#[derive(Debug)]
pub enum ValidateError {
    /// Caller input failed validation; maps to a 400 `invalid` envelope.
    Invalid(Box<ValidationFailure>),
    /// The schema itself is misconfigured; surfaced to the platform.
    Config(HandlerExecuteError),
}

/// Validate `request` (and any extracted path parameters) against `schema`.
pub fn validate(
    schema: &Schema,
    request: &Request,
    path_params: &[Option<String>],
) -> Result<Validated, ValidateError> {
    let mut messages = Vec::new();
    let mut shape = BTreeMap::new();
    let mut validated = Validated::default();

    if let Some(fields) = &schema.body {
        shape.insert(
            Section::Body.key().to_string(),
            flatten_object(Section::Body.key(), fields),
        );
        validated.body = Some(check_body(fields, request, &mut messages));
    }

    for (section, fields, input) in [
        (Section::Headers, &schema.headers, &request.headers),
        (Section::Cookies, &schema.cookies, &request.cookies),
        (Section::Query, &schema.query, &request.query),
    ] {
        if let Some(fields) = fields {
            shape.insert(
                section.key().to_string(),
                flatten_object(section.key(), fields),
            );
            let output = check_string_section(section, fields, input, &mut messages)
                .map_err(ValidateError::Config)?;
            match section {
                Section::Headers => validated.headers = Some(output),
                Section::Cookies => validated.cookies = Some(output),
                Section::Query => validated.query = Some(output),
                _ => unreachable!(),
            }
        }
    }

    if let Some(specs) = &schema.path_params {
        shape.insert(
            Section::PathParams.key().to_string(),
            flatten_tuple(Section::PathParams.key(), specs),
        );
        check_path_params(specs, path_params, &mut messages).map_err(ValidateError::Config)?;
        validated.path_params = Some(path_params.to_vec());
    }

    if messages.is_empty() {
        Ok(validated)
    } else {
        Err(ValidateError::Invalid(Box::new(ValidationFailure {
            messages,
            schema: shape,
        })))
    }
}

fn check_body(fields: &ObjectSchema, request: &Request, messages: &mut Vec<String>) -> Value {
    match request.json_body() {
        Err(e) => {
            // Shape is unknowable; report the decode failure alone.
            messages.push(e.message().to_string());
            Value::Object(Map::new())
        }
        Ok(None) => {
            // A section that only declares optional fields is satisfied by
            // no input at all.
            if has_required_field(fields) {
                messages.push(Section::Body.no_input_message());
            }
            check_object(Section::Body.key(), fields, &Map::new(), messages)
        }
        Ok(Some(Value::Object(map))) => {
            check_object(Section::Body.key(), fields, &map, messages)
        }
        Ok(Some(_)) => {
            messages.push("Expected `body` to be an object.".to_string());
            Value::Object(Map::new())
        }
    }
}

/// Validate one declared field against a JSON value, returning the value
/// filtered down to declared keys.
fn check_value(path: &str, spec: &FieldSpec, value: &Value, messages: &mut Vec<String>) -> Value {
    match (&spec.kind, value) {
        (FieldKind::Any, v) => v.clone(),
        (FieldKind::String, Value::String(_)) => value.clone(),
        (FieldKind::Number, v) if v.is_number() => v.clone(),
        (FieldKind::Boolean, Value::Bool(_)) => value.clone(),
        (FieldKind::Array(inner), Value::Array(items)) => {
            let element = FieldSpec {
                kind: (**inner).clone(),
                required: true,
                message: spec.message.clone(),
            };
            Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| check_value(&format!("{path}[{i}]"), &element, item, messages))
                    .collect(),
            )
        }
        (FieldKind::Object(fields), Value::Object(map)) => {
            check_object(path, fields, map, messages)
        }
        (kind, _) => {
            messages.push(failure_message(spec, || {
                format!("Expected `{path}` to be of type `{}`.", kind.name())
            }));
            value.clone()
        }
    }
}

fn check_object(
    prefix: &str,
    fields: &ObjectSchema,
    input: &Map<String, Value>,
    messages: &mut Vec<String>,
) -> Value {
    let mut out = Map::new();
    for (name, spec) in fields {
        let path = format!("{prefix}.{name}");
        match input.get(name) {
            None => {
                if spec.required {
                    messages.push(failure_message(spec, || {
                        format!("Missing required field `{path}`.")
                    }));
                }
            }
            Some(value) => {
                out.insert(name.clone(), check_value(&path, spec, value, messages));
            }
        }
    }
    Value::Object(out)
}

fn check_string_section(
    section: Section,
    fields: &ObjectSchema,
    input: &HashMap<String, String>,
    messages: &mut Vec<String>,
) -> Result<HashMap<String, String>, HandlerExecuteError> {
    if input.is_empty() && has_required_field(fields) {
        messages.push(section.no_input_message());
    }

    let mut out = HashMap::new();
    for (name, spec) in fields {
        let value = if section == Section::Headers {
            // Header names are case-insensitive.
            input
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        } else {
            input.get(name).map(String::as_str)
        };

        let path = format!("{}.{}", section.key(), name);
        match value {
            None => {
                if spec.required {
                    messages.push(failure_message(spec, || {
                        format!("Missing required field `{path}`.")
                    }));
                }
            }
            Some(raw) => {
                check_scalar(section, &path, spec, raw, messages)?;
                out.insert(name.clone(), raw.to_string());
            }
        }
    }
    Ok(out)
}

fn check_path_params(
    specs: &[FieldSpec],
    provided: &[Option<String>],
    messages: &mut Vec<String>,
) -> Result<(), HandlerExecuteError> {
    if provided.iter().all(Option::is_none) && specs.iter().any(|spec| spec.required) {
        messages.push(Section::PathParams.no_input_message());
    }

    for (index, spec) in specs.iter().enumerate() {
        let path = format!("{}[{index}]", Section::PathParams.key());
        match provided.get(index).and_then(Option::as_deref) {
            None => {
                if spec.required {
                    messages.push(failure_message(spec, || {
                        format!("Missing required path parameter `{path}`.")
                    }));
                }
            }
            Some(raw) => check_scalar(Section::PathParams, &path, spec, raw, messages)?,
        }
    }
    Ok(())
}

/// Type-check a string-carried scalar (header, cookie, query, path
/// parameter) against the declared kind.
fn check_scalar(
    section: Section,
    path: &str,
    spec: &FieldSpec,
    raw: &str,
    messages: &mut Vec<String>,
) -> Result<(), HandlerExecuteError> {
    let ok = match &spec.kind {
        FieldKind::String | FieldKind::Any => true,
        FieldKind::Number => raw.parse::<f64>().is_ok(),
        FieldKind::Boolean => matches!(raw, "true" | "false"),
        kind @ (FieldKind::Array(_) | FieldKind::Object(_)) => {
            return Err(HandlerExecuteError::UnsupportedFieldKind {
                section: section.key(),
                kind: kind.name(),
            });
        }
    };

    if !ok {
        messages.push(failure_message(spec, || {
            format!("Expected `{path}` to be of type `{}`.", spec.kind.name())
        }));
    }
    Ok(())
}

fn failure_message(spec: &FieldSpec, default: impl FnOnce() -> String) -> String {
    spec.message.clone().unwrap_or_else(default)
}

fn has_required_field(fields: &ObjectSchema) -> bool {
    fields.values().any(|spec| spec.required)
}
