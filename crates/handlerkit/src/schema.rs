//! Typed schema model for request validation.
//!
//! A [`Schema`] declares which sections of a request are validated and what
//! shape each declared section must have. Sections that are not declared
//! are never validated and never reported. The model is deliberately typed:
//! `headers`, `cookies`, and `query` only accept object schemas, and
//! `path_params` only accepts a tuple schema, so most of the configuration
//! mistakes a stringly-typed schema language allows are unrepresentable
//! here.

use std::collections::BTreeMap;

/// The expected shape of a single field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// Homogeneous array of the inner kind.
    Array(Box<FieldKind>),
    /// Nested object with its own declared fields.
    Object(ObjectSchema),
    /// Accept any JSON value.
    Any,
}

impl FieldKind {
    /// Short type name used in flattened schema lines and messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array(_) => "array",
            FieldKind::Object(_) => "object",
            FieldKind::Any => "any",
        }
    }
}

/// Declaration for a single field: expected kind, whether it is required,
/// and an optional configured failure message.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub required: bool,
    pub message: Option<String>,
}

impl FieldSpec {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: true,
            message: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn array(inner: FieldKind) -> Self {
        Self::new(FieldKind::Array(Box::new(inner)))
    }

    pub fn object(fields: ObjectSchema) -> Self {
        Self::new(FieldKind::Object(fields))
    }

    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    /// Mark the field as optional; absent input no longer fails.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Override the default failure message for this field.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Object schema: declared field name → spec. `BTreeMap` keeps message and
/// flattened-line ordering deterministic.
pub type ObjectSchema = BTreeMap<String, FieldSpec>;

/// Build an [`ObjectSchema`] from `(name, spec)` pairs.
pub fn object_schema<I>(fields: I) -> ObjectSchema
where
    I: IntoIterator<Item = (&'static str, FieldSpec)>,
{
    fields
        .into_iter()
        .map(|(name, spec)| (name.to_string(), spec))
        .collect()
}

/// Validation schema for a handler, one optional declaration per request
/// section.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub body: Option<ObjectSchema>,
    pub headers: Option<ObjectSchema>,
    pub cookies: Option<ObjectSchema>,
    pub query: Option<ObjectSchema>,
    /// Tuple schema for extracted path parameters, positional.
    pub path_params: Option<Vec<FieldSpec>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, fields: ObjectSchema) -> Self {
        self.body = Some(fields);
        self
    }

    pub fn headers(mut self, fields: ObjectSchema) -> Self {
        self.headers = Some(fields);
        self
    }

    pub fn cookies(mut self, fields: ObjectSchema) -> Self {
        self.cookies = Some(fields);
        self
    }

    pub fn query(mut self, fields: ObjectSchema) -> Self {
        self.query = Some(fields);
        self
    }

    pub fn path_params(mut self, specs: Vec<FieldSpec>) -> Self {
        self.path_params = Some(specs);
        self
    }
}

/// Flatten an object schema into expected-shape lines using dot/bracket
/// notation, e.g. `body.key[0].sub: string`.
pub fn flatten_object(section: &str, fields: &ObjectSchema) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, spec) in fields {
        flatten_spec(&format!("{section}.{name}"), spec, &mut lines);
    }
    lines
}

/// Flatten a tuple schema (path parameters) into positional lines, e.g.
/// `pathParameters[0]: string`.
pub fn flatten_tuple(section: &str, specs: &[FieldSpec]) -> Vec<String> {
    let mut lines = Vec::new();
    for (index, spec) in specs.iter().enumerate() {
        flatten_spec(&format!("{section}[{index}]"), spec, &mut lines);
    }
    lines
}

fn flatten_spec(path: &str, spec: &FieldSpec, out: &mut Vec<String>) {
    match &spec.kind {
        FieldKind::Object(fields) => {
            for (name, inner) in fields {
                flatten_spec(&format!("{path}.{name}"), inner, out);
            }
        }
        FieldKind::Array(inner) => {
            let element = FieldSpec {
                kind: (**inner).clone(),
                required: spec.required,
                message: None,
            };
            flatten_spec(&format!("{path}[0]"), &element, out);
        }
        kind => out.push(format!("{path}: {}", kind.name())),
    }
}
