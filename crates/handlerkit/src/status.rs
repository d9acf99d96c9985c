//! HTTP status code taxonomy.
//!
//! Maps every enumerated 1xx–5xx status code to its canonical reason
//! phrase plus a one-sentence human description. The `fail` and `error`
//! envelope shapes use these to populate `title` and `description` so that
//! callers see consistent wording regardless of which handler raised the
//! status.

use http::StatusCode;

/// Canonical name and human description for an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInfo {
    pub code: u16,
    pub title: &'static str,
    pub description: &'static str,
}

/// Look up the taxonomy entry for a status code.
///
/// Unassigned codes fall back to a generic entry for their class; codes
/// outside 100–599 fall back to the 500 entry.
pub fn status_info(code: u16) -> StatusInfo {
    let title = StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_else(|| class_title(code));

    StatusInfo {
        code,
        title,
        description: description(code),
    }
}

fn class_title(code: u16) -> &'static str {
    match code {
        100..=199 => "Informational",
        200..=299 => "Successful",
        300..=399 => "Redirection",
        400..=499 => "Client Error",
        _ => "Server Error",
    }
}

fn description(code: u16) -> &'static str {
    match code {
        100 => "The initial part of the request has been received and the client may continue.",
        101 => "The server is switching protocols as requested by the client.",
        102 => "The server has received the request and is processing it.",
        103 => "The server is likely to send a final response with the included headers.",
        200 => "The request succeeded.",
        201 => "The request succeeded and a new resource was created.",
        202 => "The request has been accepted for processing but is not complete.",
        203 => "The returned metadata was transformed by a proxy.",
        204 => "The request succeeded and there is no content to return.",
        205 => "The request succeeded and the client should reset its document view.",
        206 => "The server is delivering only part of the resource.",
        300 => "The request has more than one possible response.",
        301 => "The requested resource has moved permanently.",
        302 => "The requested resource resides temporarily under a different URI.",
        303 => "The response can be found under a different URI using GET.",
        304 => "The resource has not been modified since the last request.",
        307 => "The request should be repeated at a different URI with the same method.",
        308 => "The request and all future requests should use a different URI.",
        400 => "The request could not be understood or was missing required parameters.",
        401 => "Authentication is required and has failed or was not provided.",
        402 => "Payment is required to access the requested resource.",
        403 => "The request was understood but is not allowed.",
        404 => "The requested resource could not be found.",
        405 => "The request method is not allowed for the requested resource.",
        406 => "The requested resource cannot produce an acceptable representation.",
        407 => "Authentication with the proxy is required.",
        408 => "The server timed out waiting for the request.",
        409 => "The request conflicts with the current state of the resource.",
        410 => "The requested resource is no longer available.",
        411 => "The request did not specify the length of its content.",
        412 => "A precondition in the request headers was not met.",
        413 => "The request payload is larger than the server is willing to process.",
        414 => "The request URI is longer than the server is willing to interpret.",
        415 => "The request payload is in a format not supported by the resource.",
        416 => "The requested range cannot be satisfied.",
        417 => "The expectation in the request headers could not be met.",
        418 => "The server refuses to brew coffee because it is a teapot.",
        421 => "The request was directed at a server that cannot produce a response.",
        422 => "The request was well-formed but could not be processed.",
        423 => "The requested resource is locked.",
        424 => "The request failed because a previous request failed.",
        426 => "The client should switch to a different protocol.",
        428 => "The request must be conditional.",
        429 => "Too many requests have been sent in a given amount of time.",
        431 => "The request header fields are too large to process.",
        451 => "The requested resource is unavailable for legal reasons.",
        500 => "The server encountered an unexpected condition.",
        501 => "The server does not support the functionality required by the request.",
        502 => "An invalid response was received from an upstream server.",
        503 => "The server is temporarily unable to handle the request.",
        504 => "An upstream server failed to respond in time.",
        505 => "The HTTP version used in the request is not supported.",
        506 => "The server has an internal configuration error in content negotiation.",
        507 => "The server has insufficient storage to complete the request.",
        508 => "The server detected an infinite loop while processing the request.",
        510 => "Further extensions to the request are required.",
        511 => "Network authentication is required to gain access.",
        100..=199 => "The request is being processed.",
        200..=299 => "The request succeeded.",
        300..=399 => "Further action is needed to complete the request.",
        400..=499 => "The request could not be fulfilled as sent.",
        _ => "The server failed to fulfil the request.",
    }
}
