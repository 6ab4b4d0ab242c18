//! Top-level error types for Sidevault.

use std::path::PathBuf;

use thiserror::Error;

use crate::persist::PersistError;
use crate::remote::ServiceError;

/// Top-level error type for the bootstrap and renewal operations.
///
/// Each variant names the step that failed and keeps the underlying cause
/// as its source. `Display` covers only this layer; print the full chain
/// (e.g. `{:#}` on an `anyhow::Error`) to see the cause.
#[derive(Debug, Error)]
pub enum SidevaultError {
    /// A required setting is missing or invalid.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Reading or writing a secret file failed.
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: PersistError,
    },

    /// Login against the store was rejected or could not be performed.
    #[error("failed to login")]
    Auth(#[source] ServiceError),

    /// Token self-lookup failed or returned malformed TTL fields.
    #[error("failed to lookup token")]
    Lookup(#[source] ServiceError),

    /// Token self-renewal failed.
    #[error("failed to renew token")]
    Renew(#[source] ServiceError),
}

impl SidevaultError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: PersistError) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io;

    use super::*;

    fn chain(err: &dyn Error) -> Vec<String> {
        let mut messages = vec![err.to_string()];
        let mut current = err.source();
        while let Some(cause) = current {
            messages.push(cause.to_string());
            current = cause.source();
        }
        messages
    }

    #[test]
    fn test_each_cause_reported_once() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = SidevaultError::Lookup(ServiceError::transport(refused));

        assert_eq!(
            chain(&err),
            ["failed to lookup token", "transport error", "connection refused"]
        );
    }

    #[test]
    fn test_io_error_names_path() {
        let err = SidevaultError::io(
            "/vault/token",
            PersistError::NotFound {
                path: PathBuf::from("/vault/token"),
            },
        );

        assert_eq!(
            chain(&err),
            ["failed to access /vault/token", "no such file: /vault/token"]
        );
    }
}
