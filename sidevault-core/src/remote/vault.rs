//! Vault HTTP implementation of [`CredentialService`].

use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Certificate, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

use super::{CredentialService, ServiceError, decode};
use crate::config::VaultSettings;
use crate::error::SidevaultError;
use crate::model::{Credential, LoginRequest, RenewalRequest, RenewedLease, TokenStatus};
use crate::secret::Secret;

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "x-vault-namespace";
const LOOKUP_SELF_PATH: &str = "auth/token/lookup-self";
const RENEW_SELF_PATH: &str = "auth/token/renew-self";

#[derive(Serialize)]
struct RenewBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    increment: Option<u64>,
}

/// Client for a Vault-compatible secret store.
///
/// The bearer token is set once via [`CredentialService::set_token`] and
/// sent as `X-Vault-Token` on lookup and renew calls. A configured namespace
/// is sent as `X-Vault-Namespace` on every call, login included.
pub struct VaultClient {
    base_url: Url,
    http: reqwest::Client,
    token: RwLock<Option<Secret>>,
}

impl VaultClient {
    /// Create a client from resolved connection settings.
    ///
    /// CA files are read here, so a missing or unreadable certificate fails
    /// before any request is made.
    pub fn new(settings: &VaultSettings) -> Result<Self, SidevaultError> {
        let base_url = settings.base_url()?;
        let mut builder = reqwest::Client::builder()
            .timeout(settings.timeout)
            .default_headers(default_headers(settings)?);

        for certificate in trusted_certificates(settings)? {
            builder = builder.add_root_certificate(certificate);
        }

        if settings.skip_verify {
            warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|e| SidevaultError::Config {
            message: format!("failed to initialize client: {}", e),
        })?;

        Ok(Self {
            base_url,
            http,
            token: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(&format!("v1/{}", path.trim_start_matches('/')))
            .map_err(|e| ServiceError::Request {
                message: format!("invalid path {:?}: {}", path, e),
            })
    }

    fn bearer(&self) -> Result<Secret, ServiceError> {
        self.token.read().clone().ok_or(ServiceError::MissingToken)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ServiceError> {
        let response = request.send().await.map_err(ServiceError::transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                errors: decode::error_messages(&body),
            });
        }

        response.json::<Value>().await.map_err(|e| ServiceError::Decode {
            message: format!("invalid JSON body: {}", e),
        })
    }
}

fn default_headers(settings: &VaultSettings) -> Result<HeaderMap, SidevaultError> {
    let mut headers = HeaderMap::new();

    let namespace = settings
        .namespace
        .as_deref()
        .map(str::trim)
        .filter(|ns| !ns.is_empty());
    if let Some(namespace) = namespace {
        let value = HeaderValue::from_str(namespace).map_err(|e| SidevaultError::Config {
            message: format!("invalid namespace {:?}: {}", namespace, e),
        })?;
        headers.insert(HeaderName::from_static(NAMESPACE_HEADER), value);
    }

    Ok(headers)
}

/// Certificates from `ca_cert` and every file in `ca_path`.
fn trusted_certificates(settings: &VaultSettings) -> Result<Vec<Certificate>, SidevaultError> {
    let mut files: Vec<PathBuf> = settings.ca_cert.iter().cloned().collect();

    if let Some(dir) = &settings.ca_path {
        let entries = std::fs::read_dir(dir).map_err(|e| SidevaultError::io(dir, e.into()))?;
        let mut found = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| SidevaultError::io(dir, e.into()))?.path();
            if path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        files.extend(found);
    }

    let mut certificates = Vec::new();
    for path in files {
        let pem = std::fs::read(&path).map_err(|e| SidevaultError::io(&path, e.into()))?;
        let bundle = Certificate::from_pem_bundle(&pem).map_err(|e| SidevaultError::Config {
            message: format!("invalid CA certificate {}: {}", path.display(), e),
        })?;
        if bundle.is_empty() {
            return Err(SidevaultError::Config {
                message: format!("no CA certificates found in {}", path.display()),
            });
        }
        certificates.extend(bundle);
    }

    Ok(certificates)
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

#[async_trait]
impl CredentialService for VaultClient {
    async fn login(&self, request: &LoginRequest) -> Result<Credential, ServiceError> {
        let url = self.endpoint(&request.login_path())?;
        tracing::debug!("Logging in at {}", url);

        let body = self.send(self.http.post(url).json(request)).await?;
        decode::credential(&body)
    }

    fn set_token(&self, token: Secret) {
        *self.token.write() = Some(token);
    }

    async fn lookup_self(&self) -> Result<TokenStatus, ServiceError> {
        let token = self.bearer()?;
        let url = self.endpoint(LOOKUP_SELF_PATH)?;

        let body = self
            .send(self.http.get(url).header(TOKEN_HEADER, token.expose()))
            .await?;
        decode::token_status(&body)
    }

    async fn renew_self(&self, request: RenewalRequest) -> Result<RenewedLease, ServiceError> {
        let token = self.bearer()?;
        let url = self.endpoint(RENEW_SELF_PATH)?;
        let payload = RenewBody {
            increment: request.increment(),
        };

        let body = self
            .send(
                self.http
                    .post(url)
                    .header(TOKEN_HEADER, token.expose())
                    .json(&payload),
            )
            .await?;
        decode::renewed_lease(&body)
    }
}
