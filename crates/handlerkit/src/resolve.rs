//! Route resolution.
//!
//! Given a request path and verb, walk the route tree to find the matching
//! handler. Static segments are matched greedily (longest prefix first);
//! segments left over after the static prefix become path-parameter
//! candidates, negotiated against the handler's declared arity one
//! segment at a time. Resolution never fails with an error: an unmatched
//! request is an explicit result the orchestrator turns into a 404.

use crate::keys::is_safe_key;
use crate::route::{Handler, RouteNode, Verb};

/// A successful match: the handler plus the extracted path parameters.
#[derive(Debug)]
pub struct Resolution<'a> {
    pub handler: &'a Handler,
    /// Segments consumed as path parameters, in order.
    pub params: Vec<String>,
    /// Parameters right-padded with `None` up to the handler's
    /// `max_params`, keeping a fixed-arity shape for validation.
    pub padded_params: Vec<Option<String>>,
}

/// An unmatched request, with any sibling verbs found along the walk for
/// `Allow`-style diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unmatched {
    pub allowed: Vec<Verb>,
}

/// Resolve `path` + `verb` against the route tree rooted at `root`.
pub fn resolve<'a>(
    root: &'a RouteNode,
    path: &str,
    verb: Verb,
) -> Result<Resolution<'a>, Unmatched> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Security boundary, not a routing miss: a denylisted segment can
    // never address a route.
    if segments.iter().any(|s| !is_safe_key(s)) {
        return Err(Unmatched::default());
    }

    // Walk the longest static prefix, keeping every node on the way down
    // so the backoff can revisit shallower depths.
    let mut chain: Vec<&RouteNode> = vec![root];
    for segment in &segments {
        match chain.last().and_then(|node| node.children.get(*segment)) {
            Some(child) => chain.push(child),
            None => break,
        }
    }

    // Back off from the deepest static match: each step up moves one more
    // trailing segment into the parameter pool. The first depth whose
    // handler accepts the parameter count wins.
    let mut allowed: Vec<Verb> = Vec::new();
    for depth in (0..chain.len()).rev() {
        let node = chain[depth];
        let params = &segments[depth..];

        match node.handlers.get(&verb) {
            Some(handler) => {
                let matched = match handler.arity {
                    None => params.is_empty(),
                    Some(arity) => arity.accepts(params.len()),
                };
                if matched {
                    let params: Vec<String> = params.iter().map(|s| s.to_string()).collect();
                    let max = handler.arity.map_or(0, |a| a.max_params);
                    let mut padded: Vec<Option<String>> =
                        params.iter().cloned().map(Some).collect();
                    padded.resize(max, None);
                    return Ok(Resolution {
                        handler,
                        params,
                        padded_params: padded,
                    });
                }
            }
            None => {
                for sibling in node.verbs() {
                    if sibling != verb && !allowed.contains(&sibling) {
                        allowed.push(sibling);
                    }
                }
            }
        }
    }

    allowed.sort();
    Err(Unmatched { allowed })
}
