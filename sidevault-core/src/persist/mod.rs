//! Secret persistence abstraction.
//!
//! This module provides:
//! - [`SecretPersistence`] - Trait for writing and reading secret files
//! - [`FilePersistence`] - Filesystem implementation with owner-only permissions
//! - [`MemoryPersistence`] - In-memory implementation for testing
//!
//! # Example
//!
//! ```rust,ignore
//! use sidevault_core::persist::{FilePersistence, SecretPersistence};
//! use sidevault_core::Secret;
//!
//! let files = FilePersistence::new();
//! files.write_secret(Path::new("/tmp/.vault-token"), &Secret::new("s.abc")).await?;
//!
//! let token = files.read_secret(Path::new("/tmp/.vault-token")).await?;
//! assert_eq!(token.expose(), "s.abc");
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::secret::Secret;

mod file;
mod memory;

pub use file::FilePersistence;
pub use memory::MemoryPersistence;

/// Error type for secret persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Nothing is stored at the requested path.
    #[error("no such file: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The stored bytes are not valid UTF-8.
    #[error("contents of {} are not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },

    /// I/O error reading or writing the file.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    Backend { message: String },
}

/// Abstraction over where secrets are written and read back.
///
/// Writes store the exact secret value with owner-only access. Reads return
/// the stored value with surrounding whitespace trimmed.
#[async_trait]
pub trait SecretPersistence: Send + Sync {
    /// Store a secret at the given path, replacing any existing value.
    async fn write_secret(&self, path: &Path, secret: &Secret) -> Result<(), PersistError>;

    /// Read the secret stored at the given path, trimmed of whitespace.
    async fn read_secret(&self, path: &Path) -> Result<Secret, PersistError>;
}
