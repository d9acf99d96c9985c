//! Error taxonomy for handler execution.
//!
//! Two distinct kinds exist and never mix:
//!
//! - [`HandlerError`]: request-level failures raised by handler or hook
//!   code. These are mapped to HTTP responses by the `on_error` hook or the
//!   default mapper.
//! - [`HandlerExecuteError`]: configuration mistakes by the route author
//!   (bad arity descriptors, a hot trigger with no hook, an error hook that
//!   itself fails). These are surfaced to the hosting platform as failed
//!   invocations, never as HTTP responses.

use thiserror::Error;

use crate::keys::UnsafeKey;
use crate::validate::ValidationFailure;

/// Convenient result alias for handler and hook code.
pub type Result<T> = std::result::Result<T, HandlerError>;

/// A failure raised while serving a single request.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Request input failed schema validation. Maps to a 400 `invalid`
    /// envelope.
    #[error("request validation failed: {}", .0.messages.join("; "))]
    Validation(Box<ValidationFailure>),

    /// A domain failure raised deliberately by handler code with an
    /// explicit status code. 4xx codes map to a `fail` envelope.
    #[error("domain error {status}{}", format_message(.message))]
    Domain {
        status: u16,
        message: Option<String>,
    },

    /// Anything else a handler or hook surfaced. Maps to an `error`
    /// envelope.
    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl HandlerError {
    /// Raise a domain failure with a status code and no message.
    pub fn domain(status: u16) -> Self {
        Self::Domain {
            status,
            message: None,
        }
    }

    /// Raise a domain failure with a status code and a caller-facing
    /// message.
    pub fn domain_msg(status: u16, message: impl Into<String>) -> Self {
        Self::Domain {
            status,
            message: Some(message.into()),
        }
    }
}

impl From<Box<ValidationFailure>> for HandlerError {
    fn from(failure: Box<ValidationFailure>) -> Self {
        Self::Validation(failure)
    }
}

// Handler code touches the cache directly; a rejected key propagates like
// any other unhandled failure.
impl From<UnsafeKey> for HandlerError {
    fn from(err: UnsafeKey) -> Self {
        Self::Unhandled(anyhow::Error::new(err))
    }
}

fn format_message(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}

/// A configuration mistake detected while executing a handler.
///
/// These represent author defects at route-declaration time and are
/// returned from `Runner::execute` instead of being mapped to an HTTP
/// response; the platform treats the invocation as failed.
#[derive(Debug, Error)]
pub enum HandlerExecuteError {
    /// A hot function trigger arrived but no `on_hot_function_trigger`
    /// hook is configured. An unhandled keep-warm signal is a deployment
    /// bug, not a silent no-op.
    #[error("hot function trigger received but no on_hot_function_trigger hook is configured")]
    MissingHotFunctionHook,

    /// The hot function trigger hook itself failed.
    #[error("hot function trigger hook failed: {0}")]
    HotFunctionTrigger(#[source] HandlerError),

    /// A handler declared an arity descriptor with `min_params` greater
    /// than `max_params`.
    #[error("invalid path parameter arity: min_params {min} exceeds max_params {max}")]
    InvalidArity { min: usize, max: usize },

    /// A handler declared a path-parameter schema whose tuple length does
    /// not match its arity descriptor's `max_params`.
    #[error("path parameter schema declares {schema_len} entries but the arity descriptor allows up to {max_params}")]
    PathParamsSchemaArity {
        schema_len: usize,
        max_params: usize,
    },

    /// A handler declared a schema but no arity descriptor covers the
    /// path-parameter tuple it validates.
    #[error("path parameter schema declared without a path parameter arity descriptor")]
    PathParamsSchemaWithoutArity,

    /// A string-valued section (`headers`, `cookies`, `queryStringParameters`,
    /// or path parameters) declared a field kind that cannot describe a
    /// string value.
    #[error("section {section} only supports scalar field kinds, got {kind}")]
    UnsupportedFieldKind {
        section: &'static str,
        kind: &'static str,
    },

    /// The `on_error` hook itself failed. There is no secondary fallback;
    /// the error propagates to the platform uncaught.
    #[error("on_error hook failed: {0}")]
    ErrorHook(#[source] HandlerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_display_includes_message() {
        let err = HandlerError::domain_msg(404, "widget missing");
        assert_eq!(err.to_string(), "domain error 404: widget missing");

        let bare = HandlerError::domain(409);
        assert_eq!(bare.to_string(), "domain error 409");
    }

    #[test]
    fn unhandled_wraps_anyhow() {
        let err: HandlerError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, HandlerError::Unhandled(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn unsafe_key_converts_to_unhandled() {
        let err: HandlerError = UnsafeKey("__proto__".to_string()).into();
        assert!(matches!(err, HandlerError::Unhandled(_)));
        assert!(err.to_string().contains("__proto__"));
    }

    #[test]
    fn execute_error_display() {
        let err = HandlerExecuteError::InvalidArity { min: 3, max: 1 };
        assert!(err.to_string().contains("min_params 3"));

        let err = HandlerExecuteError::MissingHotFunctionHook;
        assert!(err.to_string().contains("hot function trigger"));
    }
}
