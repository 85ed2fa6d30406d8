use std::fmt;

/// A wrapper for credential material that must never reach a log sink.
///
/// The validated token carries its opaque token id inside a `Secret`. The id
/// is the bearer credential itself, so it is never part of a scope record and
/// must not show up when a token or a decorator is formatted for diagnostics.
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, `Serialize`
/// - Debug and Display output is always `[REDACTED]`
/// - Access requires the explicit [`expose_secret`](Self::expose_secret) call
///
/// # Examples
///
/// ```
/// use scope_audit::Secret;
///
/// let token_id = Secret::new("gAAAAABk-token".to_string());
/// assert_eq!(format!("{:?}", token_id), "[REDACTED]");
/// assert_eq!(token_id.expose_secret(), "gAAAAABk-token");
/// ```
// Do NOT derive Clone: a token is moved into exactly one decorator and
// duplicating its credential would break that ownership.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    ///
    /// The result must not be logged.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
