//! Route tree declaration.
//!
//! A route tree is a nested mapping built once at startup and read-only
//! afterwards: segment keys lead to child nodes, verb keys lead to handler
//! functions. A handler may declare a path-parameter arity descriptor
//! and/or a validation schema; both are carried alongside the function and
//! consumed by the resolver and validator.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::lifecycle::Context;
use crate::response::Cookie;
use crate::schema::Schema;

/// Boxed future used by boxed handler and hook functions.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// HTTP verbs supported as terminal route keys (lowercase on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Verb {
    /// Lowercase verb name as used in route declarations.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
            Verb::Head => "head",
            Verb::Options => "options",
        }
    }

    /// Parse a verb name, accepting any letter case.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "get" => Some(Verb::Get),
            "post" => Some(Verb::Post),
            "put" => Some(Verb::Put),
            "patch" => Some(Verb::Patch),
            "delete" => Some(Verb::Delete),
            "head" => Some(Verb::Head),
            "options" => Some(Verb::Options),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds on how many path parameters a handler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min_params: usize,
    pub max_params: usize,
}

impl Arity {
    pub fn new(min_params: usize, max_params: usize) -> Self {
        Self {
            min_params,
            max_params,
        }
    }

    pub(crate) fn accepts(&self, count: usize) -> bool {
        self.min_params <= count && count <= self.max_params
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.min_params <= self.max_params
    }
}

/// What a handler produces on success: a payload for the `success`
/// envelope plus any response metadata it wants to contribute.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    /// Response status code; defaults to 200 when not set.
    pub status_code: Option<u16>,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<Cookie>,
    /// Payload placed in the envelope's `data` field.
    pub body: Value,
}

impl HandlerResponse {
    pub fn new(body: Value) -> Self {
        Self {
            status_code: None,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body,
        }
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
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

impl From<Value> for HandlerResponse {
    fn from(body: Value) -> Self {
        Self::new(body)
    }
}

type HandlerFn = Arc<dyn Fn(Context) -> BoxFuture<crate::Result<HandlerResponse>> + Send + Sync>;

/// An asynchronous route handler with its optional arity descriptor and
/// validation schema.
#[derive(Clone)]
pub struct Handler {
    func: HandlerFn,
    pub(crate) arity: Option<Arity>,
    pub(crate) schema: Option<Arc<Schema>>,
}

impl Handler {
    /// Wrap an async function as a route handler.
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<R>> + Send + 'static,
        R: Into<HandlerResponse>,
    {
        let func: HandlerFn = Arc::new(move |cx| {
            let fut = f(cx);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        Self {
            func,
            arity: None,
            schema: None,
        }
    }

    /// Declare the path-parameter arity this handler accepts.
    pub fn path_params(mut self, min_params: usize, max_params: usize) -> Self {
        self.arity = Some(Arity::new(min_params, max_params));
        self
    }

    /// Attach a validation schema; the handler then receives a
    /// `validated` input object instead of raw request sections.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub(crate) fn invoke(&self, cx: Context) -> BoxFuture<crate::Result<HandlerResponse>> {
        (self.func)(cx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("arity", &self.arity)
            .field("schema", &self.schema.is_some())
            .finish()
    }
}

/// One node of the route tree: verb keys are terminal (handlers), segment
/// keys are branches (child nodes).
#[derive(Debug, Clone, Default)]
pub struct RouteNode {
    pub(crate) handlers: HashMap<Verb, Handler>,
    pub(crate) children: HashMap<String, RouteNode>,
}

impl RouteNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a child node under a path segment.
    pub fn at(mut self, segment: impl Into<String>, node: RouteNode) -> Self {
        self.children.insert(segment.into(), node);
        self
    }

    /// Attach a handler under a verb key.
    pub fn on(mut self, verb: Verb, handler: Handler) -> Self {
        self.handlers.insert(verb, handler);
        self
    }

    pub fn get(self, handler: Handler) -> Self {
        self.on(Verb::Get, handler)
    }

    pub fn post(self, handler: Handler) -> Self {
        self.on(Verb::Post, handler)
    }

    pub fn put(self, handler: Handler) -> Self {
        self.on(Verb::Put, handler)
    }

    pub fn patch(self, handler: Handler) -> Self {
        self.on(Verb::Patch, handler)
    }

    pub fn delete(self, handler: Handler) -> Self {
        self.on(Verb::Delete, handler)
    }

    /// Verbs with handlers at this node, sorted for deterministic output.
    pub(crate) fn verbs(&self) -> Vec<Verb> {
        let mut verbs: Vec<Verb> = self.handlers.keys().copied().collect();
        verbs.sort();
        verbs
    }
}
