//! Lambda entry point for the sample widgets API.

use handlerkit_lambda::init_tracing_with;
use handlerkit_sample::{build_runner, config_from_env};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let config = config_from_env();
    init_tracing_with(config.dev_mode);

    let runner = build_runner(config)?;
    handlerkit_lambda::run(runner).await
}
