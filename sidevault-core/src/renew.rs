//! Token renewal scheduling.
//!
//! The scheduler loads the persisted store token, then loops forever:
//! look up the token's TTL, renew it if at most half of its creation TTL
//! remains, and sleep for the configured frequency. Any failure ends the
//! loop with an error; restarting is left to the process supervisor.
//!
//! The sleep between cycles is the only point where the loop can be
//! stopped through its [`CancellationToken`].

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RenewSettings;
use crate::error::SidevaultError;
use crate::model::{RenewalRequest, RenewedLease, TokenStatus};
use crate::persist::SecretPersistence;
use crate::remote::CredentialService;

/// Whether a token should be renewed now.
///
/// True once the remaining TTL is at or below half the creation TTL
/// (integer division).
pub fn should_renew(status: &TokenStatus) -> bool {
    status.current_ttl <= status.creation_ttl / 2
}

/// Lease to request on renewal.
///
/// A non-zero override wins; otherwise the token is extended by its full
/// creation TTL.
pub fn determine_lease(status: &TokenStatus, lease_override: u64) -> u64 {
    if lease_override != 0 {
        lease_override
    } else {
        status.creation_ttl
    }
}

/// Result of a single lookup-and-maybe-renew cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The token is above the threshold; nothing was done.
    Healthy(TokenStatus),

    /// The token was renewed with the given lease increment.
    Renewed {
        status: TokenStatus,
        lease_increment: u64,
        lease: RenewedLease,
    },
}

/// Keeps a single store token alive.
pub struct RenewalScheduler<S: CredentialService> {
    service: S,
    settings: RenewSettings,
}

impl<S: CredentialService> RenewalScheduler<S> {
    /// Create a scheduler over the given service client.
    pub fn new(service: S, settings: RenewSettings) -> Self {
        Self { service, settings }
    }

    /// Read the persisted token and attach it to the service client.
    pub async fn load_token(
        &self,
        path: &Path,
        persistence: &dyn SecretPersistence,
    ) -> Result<(), SidevaultError> {
        let token = persistence
            .read_secret(path)
            .await
            .map_err(|e| SidevaultError::io(path, e))?;

        self.service.set_token(token);
        info!("Loaded token from {:?}", path);
        Ok(())
    }

    /// Look up the current token's TTL state.
    pub async fn lookup_status(&self) -> Result<TokenStatus, SidevaultError> {
        let status = self
            .service
            .lookup_self()
            .await
            .map_err(SidevaultError::Lookup)?;

        if status.is_anomalous() {
            warn!(
                "Token ttl {}s exceeds creation ttl {}s",
                status.current_ttl, status.creation_ttl
            );
        }
        Ok(status)
    }

    /// Renew the current token by `lease_increment` seconds.
    pub async fn renew(&self, lease_increment: u64) -> Result<RenewedLease, SidevaultError> {
        self.service
            .renew_self(RenewalRequest::new(lease_increment))
            .await
            .map_err(SidevaultError::Renew)
    }

    /// Run one lookup, renewing the token if it is below the threshold.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, SidevaultError> {
        let status = self.lookup_status().await?;
        debug!(
            "Token ttl {}s of {}s",
            status.current_ttl, status.creation_ttl
        );

        if !should_renew(&status) {
            return Ok(CycleOutcome::Healthy(status));
        }

        let lease_increment = determine_lease(&status, self.settings.lease_override);
        info!(
            "Token ttl {}s below threshold {}s, renewing token for {}s",
            status.current_ttl,
            status.creation_ttl / 2,
            lease_increment
        );

        let lease = self.renew(lease_increment).await?;
        let expires_at = lease.expires_at();
        info!(
            "Token renewed successfully, lease {}s (expires around {:?}, renewable: {})",
            lease.lease_duration, expires_at, lease.renewable
        );

        Ok(CycleOutcome::Renewed {
            status,
            lease_increment,
            lease,
        })
    }

    /// Loop until cancelled or until a lookup or renewal fails.
    ///
    /// Cancellation is observed while sleeping between cycles; a cycle that
    /// has already started runs to completion first.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), SidevaultError> {
        self.settings.validate()?;

        info!(
            "Checking token every {}s",
            self.settings.frequency.as_secs_f64()
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.run_cycle().await?;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.frequency) => {}
            }
        }

        info!("Renewal loop stopped");
        Ok(())
    }
}
