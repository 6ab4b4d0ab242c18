//! # Sidevault Core
//!
//! Credential lifecycle logic for a secret-store sidecar.
//!
//! This crate provides:
//! - Domain types for login requests, credentials, and token TTL state
//! - Traits for the remote credential service and for secret persistence
//! - The bootstrap authenticator that exchanges an identity token for a store token
//! - The renewal scheduler that keeps that store token alive
//! - A Vault HTTP client (with the `vault` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sidevault_core::{auth, FilePersistence, Settings, VaultClient};
//!
//! async fn bootstrap(settings: &Settings) -> Result<(), sidevault_core::SidevaultError> {
//!     let client = VaultClient::new(&settings.vault)?;
//!     let files = FilePersistence::new();
//!     let credential = auth::authenticate(&settings.auth, &client, &files).await?;
//!     auth::persist_credential(&credential, &settings.paths, &files).await
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod persist;
pub mod remote;
pub mod renew;
pub mod secret;

// Re-export commonly used types at crate root
pub use model::{
    Credential,
    LoginRequest,
    RenewalRequest,
    RenewedLease,
    TokenStatus,
};

pub use secret::Secret;

pub use config::{
    AuthSettings,
    PathSettings,
    RenewSettings,
    Settings,
    VaultSettings,
};

pub use error::SidevaultError;

pub use persist::{
    FilePersistence,
    MemoryPersistence,
    PersistError,
    SecretPersistence,
};

pub use remote::{CredentialService, ServiceError};

#[cfg(feature = "vault")]
pub use remote::VaultClient;

pub use renew::{
    CycleOutcome,
    RenewalScheduler,
    determine_lease,
    should_renew,
};
