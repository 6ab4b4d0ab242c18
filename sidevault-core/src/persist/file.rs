//! Filesystem-backed secret persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{PersistError, SecretPersistence};
use crate::secret::Secret;

/// Permission bits for secret files: owner read/write only.
#[cfg(unix)]
const SECRET_FILE_MODE: u32 = 0o600;

/// Filesystem secret persistence.
///
/// Each write goes to a temporary sibling file which is then renamed over
/// the target, so readers see either the old or the new value, never a
/// partial one. Atomicity is per file: writing the token and then the
/// accessor is still two independent operations.
#[derive(Debug, Clone, Default)]
pub struct FilePersistence;

impl FilePersistence {
    /// Create a new filesystem persistence backend.
    pub fn new() -> Self {
        Self
    }

    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "secret".to_string());
        path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
    }

    async fn write_temp(temp: &Path, secret: &Secret) -> Result<(), PersistError> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(SECRET_FILE_MODE);

        let mut file = options.open(temp).await?;

        // A leftover temp file keeps its old mode, so tighten it explicitly.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp, std::fs::Permissions::from_mode(SECRET_FILE_MODE)).await?;
        }

        file.write_all(secret.expose().as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl SecretPersistence for FilePersistence {
    async fn write_secret(&self, path: &Path, secret: &Secret) -> Result<(), PersistError> {
        let temp = Self::temp_path(path);

        if let Err(e) = Self::write_temp(&temp, secret).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp, path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::debug!("Wrote secret file {:?}", path);
        Ok(())
    }

    async fn read_secret(&self, path: &Path) -> Result<Secret, PersistError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PersistError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let raw = String::from_utf8(bytes).map_err(|_| PersistError::Encoding {
            path: path.to_path_buf(),
        })?;

        Ok(Secret::from_trimmed(&raw))
    }
}
