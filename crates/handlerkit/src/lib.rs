//! Route resolution, schema validation, and lifecycle orchestration for
//! serverless handlers.
//!
//! This crate is the platform-agnostic core of the toolkit:
//!
//! - [`RouteNode`]: statically declared route tree (segments and verbs)
//! - [`resolve`]: longest-static-prefix route resolution with typed
//!   path-parameter arity negotiation
//! - [`Schema`]/[`validate`]: per-section request validation with
//!   aggregated failure reporting
//! - [`Runner`]: the lifecycle orchestrator (cold start, hot trigger,
//!   request hooks, error mapping, timing)
//! - [`Envelope`]/[`Formatter`]: JSend-derived response formatting
//! - [`Cache`]: shared in-process TTL store
//!
//! Hosting adapters (e.g. the AWS Lambda crate) convert platform events
//! into [`Request`] values and forward them to [`Runner::execute`].

#![deny(warnings)]

mod cache;
mod creatable;
mod error;
mod keys;
mod lifecycle;
mod request;
mod resolve;
mod response;
mod route;
mod schema;
mod status;
mod validate;

pub use cache::Cache;
pub use creatable::Creatable;
pub use error::{HandlerError, HandlerExecuteError, Result};
pub use keys::{is_safe_key, safe_key, UnsafeKey};
pub use lifecycle::{
    Context, HookOutcome, Hooks, ProcessContext, ProcessState, Runner, RunnerBuilder, RunnerConfig,
};
pub use request::{
    is_hot_function_trigger, BodyError, Invocation, Request, RequestContext,
    HOT_FUNCTION_TRIGGER_KEY,
};
pub use resolve::{resolve, Resolution, Unmatched};
pub use response::{
    Cookie, Envelope, ErrorData, FailData, Formatter, HttpResponse, InvalidData, RawResponse,
    ResponseContext, SameSite,
};
pub use route::{Arity, BoxFuture, Handler, HandlerResponse, RouteNode, Verb};
pub use schema::{flatten_object, flatten_tuple, object_schema, FieldKind, FieldSpec, Schema};
pub use status::{status_info, StatusInfo};
pub use validate::{validate, Section, Validated, ValidateError, ValidationFailure};
