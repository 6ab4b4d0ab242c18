//! A wrapper for sensitive values that prevents accidental logging.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the backing memory is zeroed when the secret is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Create a secret from raw file contents, trimming surrounding whitespace.
    pub fn from_trimmed(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}
