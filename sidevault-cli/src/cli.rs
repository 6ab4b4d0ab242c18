//! Command-line arguments.
//!
//! Every flag can also be set through the environment variable named after
//! it (`--token-path` / `TOKEN_PATH`). Flags left unset fall back to the
//! config file, then to built-in defaults.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sidevault")]
#[command(about = "Tools for handling Vault token management in Kubernetes")]
#[command(version)]
pub struct Cli {
    /// Optional TOML file with default settings
    #[arg(long, global = true, env = "SIDEVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// File system path to the Vault token
    #[arg(long, global = true, env = "TOKEN_PATH")]
    pub token_path: Option<PathBuf>,

    /// File system path to the Vault token accessor
    #[arg(long, global = true, env = "ACCESSOR_PATH")]
    pub accessor_path: Option<PathBuf>,

    /// Address of the Vault server
    #[arg(long, global = true, env = "VAULT_ADDR")]
    pub vault_addr: Option<String>,

    /// Timeout for each Vault request, in seconds
    #[arg(long, global = true, env = "VAULT_CLIENT_TIMEOUT")]
    pub vault_timeout: Option<u64>,

    /// PEM file with CA certificates used to verify the Vault server
    #[arg(long, global = true, env = "VAULT_CACERT")]
    pub vault_cacert: Option<PathBuf>,

    /// Directory of PEM files with CA certificates used to verify the Vault server
    #[arg(long, global = true, env = "VAULT_CAPATH")]
    pub vault_capath: Option<PathBuf>,

    /// Skip TLS certificate verification (insecure)
    #[arg(long, global = true, env = "VAULT_SKIP_VERIFY", value_parser = BoolishValueParser::new())]
    pub vault_skip_verify: Option<bool>,

    /// Vault namespace to send with every request
    #[arg(long, global = true, env = "VAULT_NAMESPACE")]
    pub vault_namespace: Option<String>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authenticate with Vault and save token to filesystem
    ///
    /// Uses the ServiceAccount token and provided role to authenticate with
    /// Vault. The returned token and accessor are saved to the filesystem.
    /// The role is required.
    Auth(AuthArgs),

    /// Renew the saved Vault token once its TTL is below the threshold
    ///
    /// Loops forever and checks the status of the token every 30 seconds
    /// unless a different frequency is provided. A renewal is made when
    /// TTL <= creation TTL / 2. The lease is extended to the original
    /// creation TTL unless a different lease is provided.
    Renew(RenewArgs),
}

#[derive(Debug, Default, Args)]
pub struct AuthArgs {
    /// Role to use for Vault authentication
    #[arg(long, env = "ROLE")]
    pub role: Option<String>,

    /// Mount path for the Kubernetes authentication backend
    #[arg(long, env = "MOUNT_PATH")]
    pub mount_path: Option<String>,

    /// File system path to the Kubernetes ServiceAccount token
    #[arg(long, env = "SA_TOKEN_PATH")]
    pub sa_token_path: Option<PathBuf>,
}

#[derive(Debug, Default, Args)]
pub struct RenewArgs {
    /// Delay between token TTL checks, in seconds
    #[arg(long, env = "FREQUENCY")]
    pub frequency: Option<u64>,

    /// Requested lease increment when renewing, in seconds (0 = creation TTL)
    #[arg(long, env = "LEASE")]
    pub lease: Option<u64>,
}
