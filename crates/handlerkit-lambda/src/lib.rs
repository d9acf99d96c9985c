//! AWS Lambda adapter for the handlerkit toolkit.
//!
//! This crate binds a platform-agnostic [`handlerkit::Runner`] to the
//! Lambda runtime:
//!
//! - [`parse_invocation`]: API Gateway HTTP API v2 payload parsing into
//!   an orchestrator invocation, with the hot-trigger marker checked
//!   before shape parsing
//! - [`init_tracing`]: JSON-formatted tracing for CloudWatch Logs
//! - [`run`]: the Lambda event loop wired to `Runner::execute`
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides an event builder for driving
//! handlers through the full parse path. Enable the `test-utils` feature
//! to access it from dependent crates.

#![deny(warnings)]

mod event;
mod runtime;
mod tracing_init;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use event::{parse_invocation, EventError};
pub use runtime::run;
pub use tracing_init::{init_tracing, init_tracing_with};
