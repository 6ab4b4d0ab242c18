//! Resolved, immutable settings handed to the core.
//!
//! The core never parses flags, files, or environment variables. The binary
//! resolves those once at startup and passes a [`Settings`] value in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::SidevaultError;

/// Default location of the store token.
pub const DEFAULT_TOKEN_PATH: &str = "/var/run/secrets/vaultproject.io/.vault-token";

/// Default location of the store token accessor.
pub const DEFAULT_ACCESSOR_PATH: &str = "/var/run/secrets/vaultproject.io/.vault-accessor";

/// Default location of the Kubernetes ServiceAccount token.
pub const DEFAULT_IDENTITY_TOKEN_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Default mount path of the Kubernetes authentication backend.
pub const DEFAULT_MOUNT_PATH: &str = "kubernetes";

/// Default delay between token TTL checks, in seconds.
pub const DEFAULT_FREQUENCY_SECS: u64 = 30;

/// Default store address.
pub const DEFAULT_VAULT_ADDR: &str = "https://127.0.0.1:8200";

/// Default request timeout for store calls, in seconds.
pub const DEFAULT_VAULT_TIMEOUT_SECS: u64 = 60;

/// Complete settings for both invocation modes.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub paths: PathSettings,
    pub auth: AuthSettings,
    pub renew: RenewSettings,
    pub vault: VaultSettings,
}

/// Where the store token and its accessor live on disk.
#[derive(Debug, Clone)]
pub struct PathSettings {
    pub token_path: PathBuf,
    pub accessor_path: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            accessor_path: PathBuf::from(DEFAULT_ACCESSOR_PATH),
        }
    }
}

/// Settings for the bootstrap login.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Role to authenticate as. Required.
    pub role: String,

    /// Mount path of the authentication backend.
    pub mount_path: String,

    /// Path to the platform identity token.
    pub identity_token_path: PathBuf,
}

impl AuthSettings {
    /// Check that the role is set.
    pub fn validate(&self) -> Result<(), SidevaultError> {
        if self.role.trim().is_empty() {
            return Err(SidevaultError::Config {
                message: "role must be specified".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            role: String::new(),
            mount_path: DEFAULT_MOUNT_PATH.to_string(),
            identity_token_path: PathBuf::from(DEFAULT_IDENTITY_TOKEN_PATH),
        }
    }
}

/// Settings for the renewal loop.
#[derive(Debug, Clone, Copy)]
pub struct RenewSettings {
    /// Delay between token TTL checks.
    pub frequency: Duration,

    /// Requested lease on renewal, in seconds. Zero means "use the creation TTL".
    pub lease_override: u64,
}

impl RenewSettings {
    /// Check that the loop has a non-zero delay between cycles.
    pub fn validate(&self) -> Result<(), SidevaultError> {
        if self.frequency.is_zero() {
            return Err(SidevaultError::Config {
                message: "renewal frequency must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RenewSettings {
    fn default() -> Self {
        Self {
            frequency: Duration::from_secs(DEFAULT_FREQUENCY_SECS),
            lease_override: 0,
        }
    }
}

/// Connection settings for the secret store.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    /// Base address, e.g. `https://vault.internal:8200`.
    pub address: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// PEM file with extra CA certificates to trust.
    pub ca_cert: Option<PathBuf>,

    /// Directory of PEM files with extra CA certificates to trust.
    pub ca_path: Option<PathBuf>,

    /// Accept any server certificate. Only for testing.
    pub skip_verify: bool,

    /// Namespace sent as `X-Vault-Namespace` on every request.
    pub namespace: Option<String>,
}

impl VaultSettings {
    /// Parse the configured address.
    pub fn base_url(&self) -> Result<Url, SidevaultError> {
        let mut url = Url::parse(&self.address).map_err(|e| SidevaultError::Config {
            message: format!("invalid store address {:?}: {}", self.address, e),
        })?;
        if url.cannot_be_a_base() {
            return Err(SidevaultError::Config {
                message: format!("store address {:?} cannot be a base URL", self.address),
            });
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_VAULT_ADDR.to_string(),
            timeout: Duration::from_secs(DEFAULT_VAULT_TIMEOUT_SECS),
            ca_cert: None,
            ca_path: None,
            skip_verify: false,
            namespace: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.paths.token_path, PathBuf::from(DEFAULT_TOKEN_PATH));
        assert_eq!(settings.auth.mount_path, "kubernetes");
        assert_eq!(settings.renew.frequency, Duration::from_secs(30));
        assert_eq!(settings.renew.lease_override, 0);
        assert_eq!(
            settings.vault.base_url().unwrap().as_str(),
            "https://127.0.0.1:8200/"
        );
    }

    #[test]
    fn test_validate_requires_role() {
        let settings = AuthSettings::default();
        assert!(matches!(settings.validate(), Err(SidevaultError::Config { .. })));

        let settings = AuthSettings {
            role: "app".to_string(),
            ..AuthSettings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_frequency() {
        let settings = RenewSettings {
            frequency: Duration::ZERO,
            lease_override: 0,
        };
        assert!(matches!(settings.validate(), Err(SidevaultError::Config { .. })));
        assert!(RenewSettings::default().validate().is_ok());
    }

    #[test]
    fn test_base_url_rejects_bad_address() {
        let settings = VaultSettings {
            address: "not a url".to_string(),
            ..VaultSettings::default()
        };
        assert!(matches!(settings.base_url(), Err(SidevaultError::Config { .. })));
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let settings = VaultSettings {
            address: "http://proxy.local/vault".to_string(),
            ..VaultSettings::default()
        };
        let url = settings.base_url().unwrap();
        assert_eq!(url.join("v1/sys/health").unwrap().as_str(), "http://proxy.local/vault/v1/sys/health");
    }
}
