//! Remote credential service abstraction.
//!
//! This module provides:
//! - [`CredentialService`] - Trait for the login, self-lookup, and self-renew operations
//! - [`ServiceError`] - Error type shared by all service implementations
//! - [`VaultClient`] - HTTP implementation against a Vault-compatible API (with `vault` feature)
//!
//! Response bodies are decoded by the functions in [`decode`], which reject
//! missing or wrongly typed fields instead of defaulting them.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Credential, LoginRequest, RenewalRequest, RenewedLease, TokenStatus};
use crate::secret::Secret;

pub mod decode;

#[cfg(feature = "vault")]
mod vault;

#[cfg(feature = "vault")]
pub use vault::VaultClient;

/// Error type for remote credential service calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request could not be delivered or the response could not be read.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-success status.
    #[error("service responded with status {status}{}", describe_errors(.errors))]
    Status { status: u16, errors: Vec<String> },

    /// The response body is missing fields or has the wrong shape.
    #[error("malformed response: {message}")]
    Decode { message: String },

    /// The request could not be built.
    #[error("invalid request: {message}")]
    Request { message: String },

    /// A token-authenticated call was made before a token was set.
    #[error("no token set on client")]
    MissingToken,
}

impl ServiceError {
    /// Wrap a transport-level failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

fn describe_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(": {}", errors.join("; "))
    }
}

/// The three operations the core consumes from the secret store.
///
/// Implementations own transport concerns such as timeouts; the core adds no
/// retries on top.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Exchange an identity token for a store token and accessor.
    async fn login(&self, request: &LoginRequest) -> Result<Credential, ServiceError>;

    /// Attach the bearer token used by [`lookup_self`](Self::lookup_self)
    /// and [`renew_self`](Self::renew_self).
    fn set_token(&self, token: Secret);

    /// Look up the TTL state of the bearer token.
    async fn lookup_self(&self) -> Result<TokenStatus, ServiceError>;

    /// Renew the bearer token.
    async fn renew_self(&self, request: RenewalRequest) -> Result<RenewedLease, ServiceError>;
}
