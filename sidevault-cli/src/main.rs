//! Sidevault CLI
//!
//! Sidecar tool that logs in to Vault with a Kubernetes ServiceAccount token
//! and keeps the resulting Vault token alive.
//!
//! # Usage
//!
//! ```bash
//! # Exchange the ServiceAccount token for a Vault token (init container)
//! sidevault auth --role my-app
//!
//! # Keep the saved token renewed (sidecar container)
//! sidevault renew --frequency 30
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use sidevault_cli::{Cli, Commands, FileConfig, load_file_config, resolve_settings};
use sidevault_core::{
    FilePersistence, RenewalScheduler, Settings, VaultClient, auth,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => {
            let file = load_file_config(path)?;
            info!("Loaded configuration from {:?}", path);
            file
        }
        None => FileConfig::default(),
    };

    let settings = resolve_settings(&cli, &file);

    match cli.command {
        Commands::Auth(_) => run_auth(&settings).await,
        Commands::Renew(_) => run_renew(&settings).await,
    }
}

async fn run_auth(settings: &Settings) -> Result<()> {
    let client = VaultClient::new(&settings.vault)?;
    let files = FilePersistence::new();

    let credential = auth::authenticate(&settings.auth, &client, &files).await?;
    auth::persist_credential(&credential, &settings.paths, &files).await?;

    Ok(())
}

async fn run_renew(settings: &Settings) -> Result<()> {
    settings.renew.validate()?;

    let client = VaultClient::new(&settings.vault)?;
    let scheduler = RenewalScheduler::new(client, settings.renew);

    scheduler
        .load_token(&settings.paths.token_path, &FilePersistence::new())
        .await?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received, stopping renewal loop...");
            cancel.cancel();
        }
    });

    scheduler.run(cancel).await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
