//! Lifecycle orchestration.
//!
//! One [`Runner::execute`] call serves one inbound invocation through a
//! fixed sequence: hot-trigger check, shutdown-hook registration, cold
//! start, request-start hook, route resolution, validation, handler
//! invocation, request-end hook, and error mapping, with phase timing and
//! a structured summary line per execution.
//!
//! Hooks return an explicit [`HookOutcome`] sum type: `Continue` (with
//! optional extra handler parameters) or `ShortCircuit` (with an early,
//! verbatim response). Process-lifetime concerns live in an explicit
//! [`ProcessState`] owned by the runner rather than ambient globals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, info_span, warn, Instrument};

use crate::cache::Cache;
use crate::creatable::Creatable;
use crate::error::{HandlerError, HandlerExecuteError};
use crate::request::{Invocation, Request};
use crate::resolve::{resolve, Unmatched};
use crate::response::{Formatter, HttpResponse, RawResponse, ResponseContext};
use crate::route::{BoxFuture, HandlerResponse, RouteNode, Verb};
use crate::validate::{validate, Validated, ValidateError};

/// Per-request context passed to handlers and request hooks.
#[derive(Debug, Clone)]
pub struct Context {
    pub request: Arc<Request>,
    pub cache: Cache,
    /// Validated input, present once the handler's schema has run.
    pub validated: Option<Arc<Validated>>,
    /// Extracted path parameters, right-padded to the handler's
    /// `max_params`.
    pub path_params: Vec<Option<String>>,
    /// Extra parameters contributed by the request-start hook.
    pub params: Option<Value>,
}

/// Context for process-level hooks (cold start, hot trigger, shutdown):
/// no request is in flight.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    pub cache: Cache,
}

/// What a request hook decided.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Proceed; the payload, if any, is merged into the handler's input
    /// parameters (request-start hook only).
    Continue(Option<Value>),
    /// Stop here and respond with this, verbatim.
    ShortCircuit(RawResponse),
}

impl HookOutcome {
    /// Transparent pass-through.
    pub fn proceed() -> Self {
        HookOutcome::Continue(None)
    }

    /// Proceed with extra handler parameters.
    pub fn with_params(params: Value) -> Self {
        HookOutcome::Continue(Some(params))
    }
}

type ProcessHook = Arc<dyn Fn(ProcessContext) -> BoxFuture<crate::Result<()>> + Send + Sync>;
type RequestHook = Arc<dyn Fn(Context) -> BoxFuture<crate::Result<HookOutcome>> + Send + Sync>;
type ResponseHook =
    Arc<dyn Fn(Context, HandlerResponse) -> BoxFuture<crate::Result<HookOutcome>> + Send + Sync>;
type ErrorHook =
    Arc<dyn Fn(Context, HandlerError) -> BoxFuture<crate::Result<RawResponse>> + Send + Sync>;

/// Optional lifecycle hooks, registered per wrapped handler set.
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) on_cold_start: Option<ProcessHook>,
    pub(crate) on_hot_function_trigger: Option<ProcessHook>,
    pub(crate) on_lambda_shutdown: Option<ProcessHook>,
    pub(crate) on_request_start: Option<RequestHook>,
    pub(crate) on_request_end: Option<ResponseHook>,
    pub(crate) on_error: Option<ErrorHook>,
}

macro_rules! process_hook_setter {
    ($name:ident) => {
        pub fn $name<F, Fut>(mut self, f: F) -> Self
        where
            F: Fn(ProcessContext) -> Fut + Send + Sync + 'static,
            Fut: std::future::Future<Output = crate::Result<()>> + Send + 'static,
        {
            self.$name = Some(Arc::new(move |cx| Box::pin(f(cx))));
            self
        }
    };
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    process_hook_setter!(on_cold_start);
    process_hook_setter!(on_hot_function_trigger);
    process_hook_setter!(on_lambda_shutdown);

    pub fn on_request_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = crate::Result<HookOutcome>> + Send + 'static,
    {
        self.on_request_start = Some(Arc::new(move |cx| Box::pin(f(cx))));
        self
    }

    pub fn on_request_end<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, HandlerResponse) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = crate::Result<HookOutcome>> + Send + 'static,
    {
        self.on_request_end = Some(Arc::new(move |cx, response| Box::pin(f(cx, response))));
        self
    }

    pub fn on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, HandlerError) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = crate::Result<RawResponse>> + Send + 'static,
    {
        self.on_error = Some(Arc::new(move |cx, error| Box::pin(f(cx, error))));
        self
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_cold_start", &self.on_cold_start.is_some())
            .field(
                "on_hot_function_trigger",
                &self.on_hot_function_trigger.is_some(),
            )
            .field("on_lambda_shutdown", &self.on_lambda_shutdown.is_some())
            .field("on_request_start", &self.on_request_start.is_some())
            .field("on_request_end", &self.on_request_end.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Explicit process-lifetime state: cold-start consumption and shutdown
/// registration. Flags flip synchronously, before any await point, so
/// concurrent invocations in one process cannot race them.
#[derive(Debug, Default)]
pub struct ProcessState {
    cold_start_consumed: AtomicBool,
    shutdown_registered: AtomicBool,
}

impl ProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` exactly once per process: the first call consumes
    /// the cold start.
    pub fn consume_cold_start(&self) -> bool {
        !self.cold_start_consumed.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` exactly once per process; later calls see the
    /// registration already made.
    pub fn try_register_shutdown(&self) -> bool {
        !self.shutdown_registered.swap(true, Ordering::SeqCst)
    }

    pub fn is_shutdown_registered(&self) -> bool {
        self.shutdown_registered.load(Ordering::SeqCst)
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Include message/cause/log-lookup fields in `error` envelopes.
    pub dev_mode: bool,
    /// Log-lookup URL template for dev-mode error envelopes;
    /// `{requestId}` is substituted.
    pub logs_url: Option<String>,
    /// Ambient headers and cookies merged under handler-contributed ones.
    pub response_context: ResponseContext,
}

/// The lifecycle orchestrator: routes, hooks, cache, and process state
/// for one wrapped handler set.
#[derive(Debug)]
pub struct Runner {
    routes: RouteNode,
    hooks: Hooks,
    cache: Cache,
    state: Arc<ProcessState>,
    formatter: Formatter,
}

impl Runner {
    pub fn builder(routes: RouteNode) -> RunnerBuilder {
        RunnerBuilder {
            routes,
            hooks: Hooks::default(),
            cache: None,
            config: RunnerConfig::default(),
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    /// Serve one invocation.
    ///
    /// `Ok` covers every request-level outcome, including 400/404/500
    /// envelopes; `Err` is reserved for configuration mistakes the
    /// platform must treat as failed invocations.
    pub async fn execute(
        &self,
        invocation: Invocation,
    ) -> Result<HttpResponse, HandlerExecuteError> {
        match invocation {
            Invocation::HotFunctionTrigger => self.execute_hot_trigger().await,
            Invocation::Request(request) => {
                let span = info_span!(
                    "request",
                    request_id = %request.context.request_id,
                    method = %request.method,
                    path = %request.raw_path,
                );
                self.execute_request(request).instrument(span).await
            }
        }
    }

    async fn execute_hot_trigger(&self) -> Result<HttpResponse, HandlerExecuteError> {
        let started = Instant::now();
        let hook = self
            .hooks
            .on_hot_function_trigger
            .as_ref()
            .ok_or(HandlerExecuteError::MissingHotFunctionHook)?;

        hook(self.process_context())
            .await
            .map_err(HandlerExecuteError::HotFunctionTrigger)?;

        info!(
            target: "summary",
            conclusion = "success",
            kind = "hot_function_trigger",
            duration_ms = started.elapsed().as_millis() as u64,
            "hot function trigger handled"
        );
        Ok(self
            .formatter
            .success(200, Value::Null, &Default::default(), &[]))
    }

    async fn execute_request(
        &self,
        request: Request,
    ) -> Result<HttpResponse, HandlerExecuteError> {
        let started = Instant::now();
        let request = Arc::new(request);

        self.register_shutdown_hook();
        self.run_cold_start().await;

        let mut cx = Context {
            request: Arc::clone(&request),
            cache: self.cache.clone(),
            validated: None,
            path_params: Vec::new(),
            params: None,
        };

        // Request-start hook: may contribute parameters or short-circuit.
        if let Some(hook) = &self.hooks.on_request_start {
            match hook(cx.clone()).await {
                Ok(HookOutcome::Continue(extra)) => cx.params = extra,
                Ok(HookOutcome::ShortCircuit(raw)) => {
                    let response = self.formatter.raw(raw);
                    self.summarize(&request, "success", response.status_code, started, None);
                    return Ok(response);
                }
                Err(error) => {
                    let response = self.error_response(&cx, error).await?;
                    self.summarize(&request, "failure", response.status_code, started, None);
                    return Ok(response);
                }
            }
        }

        // Route resolution: a miss is a 404, never an error. An
        // unrecognized verb can match nothing.
        let resolved = match Verb::parse(&request.method) {
            Some(verb) => resolve(&self.routes, &request.raw_path, verb),
            None => Err(Unmatched::default()),
        };
        let resolution = match resolved {
            Ok(resolution) => resolution,
            Err(unmatched) => {
                let response = self.formatter.not_found(&unmatched.allowed);
                self.summarize(&request, "failure", 404, started, None);
                return Ok(response);
            }
        };

        // Validation: caller mistakes become a 400, schema mistakes are
        // fatal.
        cx.path_params = resolution.padded_params.clone();
        if let Some(schema) = &resolution.handler.schema {
            match validate(schema, &request, &resolution.padded_params) {
                Ok(validated) => cx.validated = Some(Arc::new(validated)),
                Err(ValidateError::Invalid(failure)) => {
                    let response = self.formatter.invalid(*failure);
                    self.summarize(&request, "failure", 400, started, None);
                    return Ok(response);
                }
                Err(ValidateError::Config(error)) => return Err(error),
            }
        }

        let pre_ms = started.elapsed().as_millis() as u64;
        let handler_started = Instant::now();
        let result = resolution.handler.invoke(cx.clone()).await;
        let handler_ms = handler_started.elapsed().as_millis() as u64;
        let post_started = Instant::now();

        let (response, conclusion) = match result {
            Ok(handler_response) => match self.finish_success(&cx, handler_response).await {
                Ok(response) => (response, "success"),
                Err(error) => (self.error_response(&cx, error).await?, "failure"),
            },
            Err(error) => (self.error_response(&cx, error).await?, "failure"),
        };

        let phases = Phases {
            pre_ms,
            handler_ms,
            post_ms: post_started.elapsed().as_millis() as u64,
        };
        self.summarize(
            &request,
            conclusion,
            response.status_code,
            started,
            Some(&phases),
        );
        Ok(response)
    }

    /// Run the request-end hook and format the final success response.
    async fn finish_success(
        &self,
        cx: &Context,
        handler_response: HandlerResponse,
    ) -> Result<HttpResponse, HandlerError> {
        if let Some(hook) = &self.hooks.on_request_end {
            match hook(cx.clone(), handler_response.clone()).await? {
                HookOutcome::Continue(_) => {}
                HookOutcome::ShortCircuit(raw) => return Ok(self.formatter.raw(raw)),
            }
        }
        let status = handler_response.status_code.unwrap_or(200);
        Ok(self.formatter.success(
            status,
            handler_response.body,
            &handler_response.headers,
            &handler_response.cookies,
        ))
    }

    /// Map a raised error through the error hook or the default mapper.
    async fn error_response(
        &self,
        cx: &Context,
        error: HandlerError,
    ) -> Result<HttpResponse, HandlerExecuteError> {
        match &self.hooks.on_error {
            Some(hook) => match hook(cx.clone(), error).await {
                Ok(raw) => Ok(self.formatter.raw(raw)),
                // No secondary fallback: the error hook's own failure
                // propagates to the platform uncaught.
                Err(hook_error) => Err(HandlerExecuteError::ErrorHook(hook_error)),
            },
            None => {
                error!(error = %error, "request failed");
                Ok(self
                    .formatter
                    .default_error(&error, &cx.request.context.request_id))
            }
        }
    }

    /// Cold start runs once per process; its failure is logged, never
    /// propagated.
    async fn run_cold_start(&self) {
        if !self.state.consume_cold_start() {
            return;
        }
        if let Some(hook) = &self.hooks.on_cold_start {
            let started = Instant::now();
            match hook(self.process_context()).await {
                Ok(()) => info!(
                    cold_start_ms = started.elapsed().as_millis() as u64,
                    "cold start hook complete"
                ),
                Err(error) => warn!(error = %error, "cold start hook failed; continuing"),
            }
        }
    }

    /// Register the shutdown listener at most once per process.
    fn register_shutdown_hook(&self) {
        let Some(hook) = &self.hooks.on_lambda_shutdown else {
            return;
        };
        if !self.state.try_register_shutdown() {
            return;
        }

        let hook = Arc::clone(hook);
        let cx = self.process_context();
        tokio::spawn(async move {
            wait_for_terminate().await;
            info!("termination signal received, running shutdown hook");
            if let Err(error) = hook(cx).await {
                error!(error = %error, "shutdown hook failed");
            }
        });
    }

    fn process_context(&self) -> ProcessContext {
        ProcessContext {
            cache: self.cache.clone(),
        }
    }

    fn summarize(
        &self,
        request: &Request,
        conclusion: &str,
        status_code: u16,
        started: Instant,
        phases: Option<&Phases>,
    ) {
        let duration_ms = started.elapsed().as_millis() as u64;
        let client_latency_ms = request
            .context
            .time_epoch_ms
            .map(|epoch| (Utc::now().timestamp_millis() - epoch).max(0));

        match phases {
            Some(p) => info!(
                target: "summary",
                conclusion,
                status_code,
                duration_ms,
                pre_ms = p.pre_ms,
                handler_ms = p.handler_ms,
                post_ms = p.post_ms,
                client_latency_ms,
                "request complete"
            ),
            None => info!(
                target: "summary",
                conclusion,
                status_code,
                duration_ms,
                client_latency_ms,
                "request complete"
            ),
        }
    }
}

struct Phases {
    pre_ms: u64,
    handler_ms: u64,
    post_ms: u64,
}

async fn wait_for_terminate() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => error!(error = %error, "failed to install SIGTERM listener"),
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(error = %error, "failed to install termination listener");
        }
    }
}

/// Builds a [`Runner`], validating the route tree's handler
/// configuration up front.
pub struct RunnerBuilder {
    routes: RouteNode,
    hooks: Hooks,
    cache: Option<Creatable<(), Cache>>,
    config: RunnerConfig,
}

impl RunnerBuilder {
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Supply the cache through a factory or constructor.
    pub fn cache_with(mut self, creatable: Creatable<(), Cache>) -> Self {
        self.cache = Some(creatable);
        self
    }

    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate handler configuration and build the runner.
    ///
    /// Arity descriptors with `min_params > max_params` and path-parameter
    /// schemas inconsistent with their arity are author mistakes, rejected
    /// here at declaration time rather than at request time.
    pub fn build(self) -> Result<Runner, HandlerExecuteError> {
        validate_tree(&self.routes)?;

        let cache = self
            .cache
            .map(|creatable| creatable.create(()))
            .unwrap_or_default();

        Ok(Runner {
            routes: self.routes,
            hooks: self.hooks,
            cache,
            state: Arc::new(ProcessState::new()),
            formatter: Formatter {
                ambient: self.config.response_context,
                dev_mode: self.config.dev_mode,
                logs_url: self.config.logs_url,
            },
        })
    }
}

fn validate_tree(node: &RouteNode) -> Result<(), HandlerExecuteError> {
    for handler in node.handlers.values() {
        if let Some(arity) = handler.arity {
            if !arity.is_valid() {
                return Err(HandlerExecuteError::InvalidArity {
                    min: arity.min_params,
                    max: arity.max_params,
                });
            }
        }
        if let Some(schema) = &handler.schema {
            if let Some(specs) = &schema.path_params {
                match handler.arity {
                    None => return Err(HandlerExecuteError::PathParamsSchemaWithoutArity),
                    Some(arity) if specs.len() != arity.max_params => {
                        return Err(HandlerExecuteError::PathParamsSchemaArity {
                            schema_len: specs.len(),
                            max_params: arity.max_params,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
    }
    for child in node.children.values() {
        validate_tree(child)?;
    }
    Ok(())
}
