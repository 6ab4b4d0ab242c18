//! Domain model types for Sidevault.
//!
//! This module defines the values that flow between the core and its
//! collaborators:
//! - [`LoginRequest`] - Identity token exchange request
//! - [`Credential`] - Store token and accessor returned by a login
//! - [`TokenStatus`] - TTL state of the current store token
//! - [`RenewalRequest`] - Requested lease increment for a renewal
//! - [`RenewedLease`] - Outcome of a successful renewal

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use crate::secret::Secret;

/// Request to exchange a platform identity token for a store token.
///
/// Serializes to the login body `{"jwt": ..., "role": ...}`. The mount path
/// only selects the login endpoint and is not part of the body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Platform-issued identity token.
    #[serde(rename = "jwt", serialize_with = "expose_secret")]
    pub identity_token: Secret,

    /// Role to authenticate as.
    pub role: String,

    /// Mount path of the authentication backend.
    #[serde(skip)]
    pub mount_path: String,
}

impl LoginRequest {
    /// Create a new login request.
    pub fn new(
        identity_token: Secret,
        role: impl Into<String>,
        mount_path: impl Into<String>,
    ) -> Self {
        Self {
            identity_token,
            role: role.into(),
            mount_path: mount_path.into(),
        }
    }

    /// Relative API path of the login endpoint, e.g. `auth/kubernetes/login`.
    pub fn login_path(&self) -> String {
        format!("auth/{}/login", self.mount_path.trim_matches('/'))
    }
}

fn expose_secret<S: Serializer>(secret: &Secret, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose())
}

/// Store token and accessor produced by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Bearer token for subsequent calls.
    pub token: Secret,

    /// Non-secret handle for auditing and revocation.
    pub accessor: String,
}

impl Credential {
    /// Create a new credential.
    pub fn new(token: Secret, accessor: impl Into<String>) -> Self {
        Self {
            token,
            accessor: accessor.into(),
        }
    }
}

/// TTL state of a store token as reported by a self-lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStatus {
    /// TTL assigned at issuance, in seconds.
    pub creation_ttl: u64,

    /// Remaining TTL, in seconds.
    pub current_ttl: u64,
}

impl TokenStatus {
    /// Create a new token status.
    pub fn new(creation_ttl: u64, current_ttl: u64) -> Self {
        Self {
            creation_ttl,
            current_ttl,
        }
    }

    /// Whether the observed TTL exceeds the creation TTL.
    ///
    /// The remote service should never report this.
    pub fn is_anomalous(&self) -> bool {
        self.current_ttl > self.creation_ttl
    }
}

/// Requested lease increment for a self-renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenewalRequest {
    /// Requested lease in seconds. Zero lets the remote service choose.
    pub lease_increment: u64,
}

impl RenewalRequest {
    /// Create a renewal request for the given lease increment.
    pub fn new(lease_increment: u64) -> Self {
        Self { lease_increment }
    }

    /// The increment to send, or `None` when the service default applies.
    pub fn increment(&self) -> Option<u64> {
        (self.lease_increment != 0).then_some(self.lease_increment)
    }
}

/// Lease granted by a successful self-renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewedLease {
    /// New lease duration in seconds.
    pub lease_duration: u64,

    /// Whether the token may be renewed again.
    pub renewable: bool,
}

impl RenewedLease {
    /// Estimated expiry instant, assuming the lease was granted just now.
    ///
    /// Returns `None` if the lease does not fit in a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let remaining = Duration::try_seconds(i64::try_from(self.lease_duration).ok()?)?;
        Utc::now().checked_add_signed(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_body() {
        let request = LoginRequest::new(Secret::new("abc.def.ghi"), "app", "kubernetes");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body, serde_json::json!({"jwt": "abc.def.ghi", "role": "app"}));
        assert_eq!(request.login_path(), "auth/kubernetes/login");
    }

    #[test]
    fn test_login_path_strips_slashes() {
        let request = LoginRequest::new(Secret::new("t"), "app", "/k8s/prod/");
        assert_eq!(request.login_path(), "auth/k8s/prod/login");
    }

    #[test]
    fn test_renewal_request_increment() {
        assert_eq!(RenewalRequest::new(0).increment(), None);
        assert_eq!(RenewalRequest::new(3600).increment(), Some(3600));
    }

    #[test]
    fn test_token_status_anomaly() {
        assert!(!TokenStatus::new(3600, 3600).is_anomalous());
        assert!(TokenStatus::new(3600, 3601).is_anomalous());
    }

    #[test]
    fn test_renewed_lease_expires_at() {
        let lease = RenewedLease {
            lease_duration: 60,
            renewable: true,
        };
        let delta = lease.expires_at().unwrap() - Utc::now();
        assert!(delta <= Duration::seconds(60));
        assert!(delta > Duration::seconds(50));

        let unbounded = RenewedLease {
            lease_duration: u64::MAX,
            renewable: false,
        };
        assert!(unbounded.expires_at().is_none());
    }
}
