//! In-memory secret persistence implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{PersistError, SecretPersistence};
use crate::secret::Secret;

/// In-memory persistence for testing and embedding.
///
/// Values are kept exactly as written; reads trim them the same way the
/// filesystem backend does.
pub struct MemoryPersistence {
    data: RwLock<HashMap<PathBuf, String>>,
}

impl MemoryPersistence {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Create a memory store with initial raw contents.
    pub fn with_data(data: HashMap<PathBuf, String>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Raw contents stored at a path, untrimmed.
    pub fn raw(&self, path: &Path) -> Option<String> {
        self.data.read().ok().and_then(|d| d.get(path).cloned())
    }
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.data.read().map(|d| d.len()).unwrap_or(0);
        f.debug_struct("MemoryPersistence")
            .field("paths_count", &count)
            .finish()
    }
}

#[async_trait]
impl SecretPersistence for MemoryPersistence {
    async fn write_secret(&self, path: &Path, secret: &Secret) -> Result<(), PersistError> {
        let mut data = self.data.write().map_err(|e| PersistError::Backend {
            message: format!("lock poisoned: {}", e),
        })?;
        data.insert(path.to_path_buf(), secret.expose().to_string());
        Ok(())
    }

    async fn read_secret(&self, path: &Path) -> Result<Secret, PersistError> {
        let data = self.data.read().map_err(|e| PersistError::Backend {
            message: format!("lock poisoned: {}", e),
        })?;
        data.get(path)
            .map(|raw| Secret::from_trimmed(raw))
            .ok_or_else(|| PersistError::NotFound {
                path: path.to_path_buf(),
            })
    }
}
