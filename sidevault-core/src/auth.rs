//! Bootstrap authentication.
//!
//! Exchanges the platform identity token for a store token and accessor,
//! then writes both to disk. This runs once at process start and never
//! retries; the caller decides whether a failure aborts the process.
//!
//! # Partial writes
//!
//! [`persist_credential`] writes the token file and then the accessor file.
//! Each file is replaced atomically, but the pair is not: if the accessor
//! write fails, the token file already holds the new token while the
//! accessor file is stale or missing.

use tracing::info;

use crate::config::{AuthSettings, PathSettings};
use crate::error::SidevaultError;
use crate::model::{Credential, LoginRequest};
use crate::persist::SecretPersistence;
use crate::remote::CredentialService;
use crate::secret::Secret;

/// Log in with the identity token and return the issued credential.
///
/// Fails with [`SidevaultError::Config`] before touching the filesystem if
/// no role is configured, [`SidevaultError::Io`] if the identity token
/// cannot be read, and [`SidevaultError::Auth`] if the login is rejected or
/// the store cannot be reached.
pub async fn authenticate(
    settings: &AuthSettings,
    service: &dyn CredentialService,
    persistence: &dyn SecretPersistence,
) -> Result<Credential, SidevaultError> {
    settings.validate()?;

    let identity_token = persistence
        .read_secret(&settings.identity_token_path)
        .await
        .map_err(|e| SidevaultError::io(&settings.identity_token_path, e))?;

    let request = LoginRequest::new(identity_token, settings.role.as_str(), settings.mount_path.as_str());
    info!(
        "Authenticating as role {:?} via {}",
        request.role,
        request.login_path()
    );

    let credential = service
        .login(&request)
        .await
        .map_err(SidevaultError::Auth)?;

    info!("Login succeeded, accessor {}", credential.accessor);
    Ok(credential)
}

/// Write the token and accessor to their configured paths.
pub async fn persist_credential(
    credential: &Credential,
    paths: &PathSettings,
    persistence: &dyn SecretPersistence,
) -> Result<(), SidevaultError> {
    persistence
        .write_secret(&paths.token_path, &credential.token)
        .await
        .map_err(|e| SidevaultError::io(&paths.token_path, e))?;
    info!("Token saved to {:?}", paths.token_path);

    persistence
        .write_secret(&paths.accessor_path, &Secret::new(credential.accessor.as_str()))
        .await
        .map_err(|e| SidevaultError::io(&paths.accessor_path, e))?;
    info!("Accessor saved to {:?}", paths.accessor_path);

    Ok(())
}
