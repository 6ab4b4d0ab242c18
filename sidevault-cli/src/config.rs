//! Settings resolution.
//!
//! Precedence is flag, then environment variable (both handled by clap),
//! then the optional TOML config file, then the core's defaults. The result
//! is resolved once and never changes for the life of the process.

use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sidevault_core::config::{
    AuthSettings, PathSettings, RenewSettings, Settings, VaultSettings,
};

use crate::cli::{AuthArgs, Cli, Commands, RenewArgs};

/// Contents of the optional config file.
///
/// Keys mirror the flag names in snake_case.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub token_path: Option<PathBuf>,
    pub accessor_path: Option<PathBuf>,
    pub role: Option<String>,
    pub mount_path: Option<String>,
    pub sa_token_path: Option<PathBuf>,
    pub frequency: Option<u64>,
    pub lease: Option<u64>,
    pub vault_addr: Option<String>,
    pub vault_timeout: Option<u64>,
    pub vault_cacert: Option<PathBuf>,
    pub vault_capath: Option<PathBuf>,
    pub vault_skip_verify: Option<bool>,
    pub vault_namespace: Option<String>,
}

/// Load the config file at `path`.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read config from {:?}: {}", path, e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow!("Failed to parse config from {:?}: {}", path, e))
}

/// Merge command-line values over file values over defaults.
pub fn resolve_settings(cli: &Cli, file: &FileConfig) -> Settings {
    let defaults = Settings::default();
    let no_auth = AuthArgs::default();
    let no_renew = RenewArgs::default();

    let (auth_args, renew_args) = match &cli.command {
        Commands::Auth(args) => (args, &no_renew),
        Commands::Renew(args) => (&no_auth, args),
    };

    let paths = PathSettings {
        token_path: pick(&cli.token_path, &file.token_path, defaults.paths.token_path),
        accessor_path: pick(
            &cli.accessor_path,
            &file.accessor_path,
            defaults.paths.accessor_path,
        ),
    };

    let auth = AuthSettings {
        role: pick(&auth_args.role, &file.role, defaults.auth.role),
        mount_path: pick(&auth_args.mount_path, &file.mount_path, defaults.auth.mount_path),
        identity_token_path: pick(
            &auth_args.sa_token_path,
            &file.sa_token_path,
            defaults.auth.identity_token_path,
        ),
    };

    let renew = RenewSettings {
        frequency: renew_args
            .frequency
            .or(file.frequency)
            .map(Duration::from_secs)
            .unwrap_or(defaults.renew.frequency),
        lease_override: pick(&renew_args.lease, &file.lease, defaults.renew.lease_override),
    };

    let vault = VaultSettings {
        address: pick(&cli.vault_addr, &file.vault_addr, defaults.vault.address),
        timeout: cli
            .vault_timeout
            .or(file.vault_timeout)
            .map(Duration::from_secs)
            .unwrap_or(defaults.vault.timeout),
        ca_cert: cli.vault_cacert.clone().or_else(|| file.vault_cacert.clone()),
        ca_path: cli.vault_capath.clone().or_else(|| file.vault_capath.clone()),
        skip_verify: pick(
            &cli.vault_skip_verify,
            &file.vault_skip_verify,
            defaults.vault.skip_verify,
        ),
        namespace: cli
            .vault_namespace
            .clone()
            .or_else(|| file.vault_namespace.clone()),
    };

    Settings {
        paths,
        auth,
        renew,
        vault,
    }
}

fn pick<T: Clone>(flag: &Option<T>, file: &Option<T>, default: T) -> T {
    flag.clone().or_else(|| file.clone()).unwrap_or(default)
}
