//! Sample widgets API built on handlerkit.
//!
//! Demonstrates the toolkit end to end: a route tree with static and
//! path-parameter routes, body/query/path schemas, lifecycle hooks, and a
//! cache-backed store shared across invocations.

#![deny(warnings)]

pub mod models;
pub mod store;

use anyhow::Context as _;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use handlerkit::{
    object_schema, Cache, Context, Creatable, FieldSpec, Handler, HandlerError,
    HandlerExecuteError, HandlerResponse, HookOutcome, Hooks, RawResponse, ResponseContext,
    RouteNode, Runner, RunnerConfig, Schema,
};

use crate::models::Widget;
use crate::store::WidgetStore;

/// Build the configured orchestrator for the widgets API.
pub fn build_runner(config: RunnerConfig) -> Result<Runner, HandlerExecuteError> {
    Runner::builder(routes())
        .hooks(hooks())
        .cache_with(Creatable::factory(|()| Cache::new()))
        .config(config)
        .build()
}

/// Default configuration: ambient service header, dev mode and log-lookup
/// URL from the environment.
pub fn config_from_env() -> RunnerConfig {
    let dev_mode = std::env::var("DEV_MODE").is_ok_and(|v| v == "1" || v == "true");
    RunnerConfig {
        dev_mode,
        logs_url: std::env::var("LOGS_URL").ok(),
        response_context: ResponseContext {
            headers: std::collections::HashMap::from([(
                "x-service".to_string(),
                "widgets-sample".to_string(),
            )]),
            cookies: Vec::new(),
        },
    }
}

fn routes() -> RouteNode {
    RouteNode::new()
        .get(Handler::new(service_info))
        .at(
            "widgets",
            RouteNode::new()
                .get(Handler::new(list_widgets).schema(
                    Schema::new().query(object_schema([("limit", FieldSpec::number().optional())])),
                ))
                .post(Handler::new(create_widget).schema(Schema::new().body(object_schema([
                    (
                        "name",
                        FieldSpec::string().message("The 'name' field is required"),
                    ),
                    ("quantity", FieldSpec::number().optional()),
                ])))),
        )
        .at(
            "widget",
            RouteNode::new()
                .get(
                    Handler::new(get_widget).path_params(1, 2).schema(
                        Schema::new().path_params(vec![
                            FieldSpec::string(),
                            FieldSpec::string().optional(),
                        ]),
                    ),
                )
                .delete(
                    Handler::new(delete_widget)
                        .path_params(1, 1)
                        .schema(Schema::new().path_params(vec![FieldSpec::string()])),
                ),
        )
}

fn hooks() -> Hooks {
    Hooks::new()
        .on_cold_start(|cx| async move { WidgetStore::new(cx.cache).seed() })
        .on_hot_function_trigger(|cx| async move {
            // Keep-warm pings also keep the inventory primed.
            let store = WidgetStore::new(cx.cache);
            store.seed()?;
            info!(widgets = store.len()?, "hot trigger warmed inventory");
            Ok(())
        })
        .on_lambda_shutdown(|cx| async move {
            let count = WidgetStore::new(cx.cache).len()?;
            info!(widgets = count, "shutting down");
            Ok(())
        })
        .on_request_start(|cx| async move {
            if cx.request.header("x-maintenance") == Some("1") {
                return Ok(HookOutcome::ShortCircuit(
                    RawResponse::new(503).body(json!("Service temporarily offline")),
                ));
            }
            Ok(HookOutcome::proceed())
        })
}

async fn service_info(_cx: Context) -> handlerkit::Result<Value> {
    Ok(json!({
        "service": "widgets-sample",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_widgets(cx: Context) -> handlerkit::Result<Value> {
    let validated = cx.validated.as_ref().context("validated input missing")?;
    let limit = validated
        .query
        .as_ref()
        .and_then(|q| q.get("limit"))
        .and_then(|raw| raw.parse::<usize>().ok());

    let mut widgets = WidgetStore::new(cx.cache.clone()).list()?;
    if let Some(limit) = limit {
        widgets.truncate(limit);
    }
    Ok(json!({ "widgets": widgets }))
}

async fn create_widget(cx: Context) -> handlerkit::Result<HandlerResponse> {
    let validated = cx.validated.as_ref().context("validated input missing")?;
    let body = validated.body.as_ref().context("validated body missing")?;

    let name = body["name"].as_str().context("name survived validation")?;
    let quantity = body["quantity"].as_i64().unwrap_or(1);

    let widget = Widget::new(
        format!("w-{}", Utc::now().timestamp_millis()),
        name,
        quantity,
    );
    WidgetStore::new(cx.cache.clone()).insert(widget.clone())?;
    info!(id = %widget.id, "widget created");

    Ok(HandlerResponse::new(serde_json::to_value(widget).context("serialize widget")?).status(201))
}

async fn get_widget(cx: Context) -> handlerkit::Result<Value> {
    let id = cx.path_params[0].as_deref().context("id parameter")?;
    let widget = WidgetStore::new(cx.cache.clone())
        .get(id)?
        .ok_or_else(|| HandlerError::domain_msg(404, format!("No widget with id `{id}`.")))?;

    match cx.path_params.get(1).and_then(Option::as_deref) {
        None => Ok(serde_json::to_value(widget).context("serialize widget")?),
        Some("id") => Ok(json!(widget.id)),
        Some("name") => Ok(json!(widget.name)),
        Some("quantity") => Ok(json!(widget.quantity)),
        Some(other) => Err(HandlerError::domain_msg(
            400,
            format!("Unknown widget field `{other}`."),
        )),
    }
}

async fn delete_widget(cx: Context) -> handlerkit::Result<Value> {
    let id = cx.path_params[0].as_deref().context("id parameter")?;
    let removed = WidgetStore::new(cx.cache.clone())
        .remove(id)?
        .ok_or_else(|| HandlerError::domain_msg(404, format!("No widget with id `{id}`.")))?;
    info!(id = %removed.id, "widget deleted");
    Ok(serde_json::to_value(removed).context("serialize widget")?)
}
