//! Unsafe-key boundary for string-indexed lookups.
//!
//! Route segments, cache keys, and cookie names all arrive as
//! caller-controlled strings and are used as map keys. Identifiers that are
//! prototype-polluting in dynamic runtimes are rejected at this boundary so
//! that every consumer shares one denylist and one typed rejection.

use thiserror::Error;

/// Identifiers that must never be used as lookup keys.
const DENYLIST: &[&str] = &["__proto__", "prototype", "constructor"];

/// A key that was rejected by the denylist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsafe key rejected: {0}")]
pub struct UnsafeKey(pub String);

/// Returns `true` when `key` is safe to use as a lookup key.
pub fn is_safe_key(key: &str) -> bool {
    !DENYLIST.contains(&key)
}

/// Check a key against the denylist, returning it unchanged when safe.
pub fn safe_key(key: &str) -> Result<&str, UnsafeKey> {
    if is_safe_key(key) {
        Ok(key)
    } else {
        Err(UnsafeKey(key.to_string()))
    }
}
