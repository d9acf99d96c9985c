//! Lambda runtime wiring for a [`Runner`].
//!
//! The runner owns the whole request lifecycle; this module only adapts
//! the Lambda event loop to it: parse the raw payload, execute, and let
//! configuration errors fail the invocation at the platform level.

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::error;

use handlerkit::{HttpResponse, Runner};

use crate::event::parse_invocation;

/// Serve `runner` on the Lambda runtime until the environment shuts the
/// process down.
pub async fn run(runner: Runner) -> Result<(), Error> {
    let runner = Arc::new(runner);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let runner = Arc::clone(&runner);
        async move { handle(&runner, event).await }
    }))
    .await
}

async fn handle(runner: &Runner, event: LambdaEvent<Value>) -> Result<HttpResponse, Error> {
    let invocation = parse_invocation(event.payload, &event.context.request_id)?;
    runner.execute(invocation).await.map_err(|e| {
        error!(request_id = %event.context.request_id, error = %e, "invocation failed");
        Error::from(e)
    })
}
