//! End-to-end tests for bootstrap authentication and the first renewal.
//!
//! These tests run the real VaultClient and FilePersistence against a mock
//! store and a temporary directory.

#![cfg(feature = "vault")]

use std::time::Duration;

use serde_json::json;
use sidevault_core::{
    AuthSettings, CycleOutcome, FilePersistence, PathSettings, RenewSettings, RenewalScheduler,
    SidevaultError, VaultClient, VaultSettings, auth,
};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

fn vault_settings(server: &MockServer) -> VaultSettings {
    VaultSettings {
        address: server.uri(),
        timeout: Duration::from_secs(5),
        ..VaultSettings::default()
    }
}

#[tokio::test]
async fn test_auth_writes_token_and_accessor() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/kubernetes/login"))
        .and(body_json(json!({"jwt": "abc.def.ghi", "role": "app"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth": {"client_token": "s.issued", "accessor": "acc-issued"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let jwt_path = dir.path().join("sa-token");
    std::fs::write(&jwt_path, "abc.def.ghi\n").unwrap();

    let auth_settings = AuthSettings {
        role: "app".to_string(),
        mount_path: "kubernetes".to_string(),
        identity_token_path: jwt_path,
    };
    let paths = PathSettings {
        token_path: dir.path().join(".vault-token"),
        accessor_path: dir.path().join(".vault-accessor"),
    };

    let client = VaultClient::new(&vault_settings(&mock_server)).unwrap();
    let files = FilePersistence::new();

    let credential = auth::authenticate(&auth_settings, &client, &files).await.unwrap();
    auth::persist_credential(&credential, &paths, &files).await.unwrap();

    assert_eq!(std::fs::read_to_string(&paths.token_path).unwrap(), "s.issued");
    assert_eq!(std::fs::read_to_string(&paths.accessor_path).unwrap(), "acc-issued");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for file in [&paths.token_path, &paths.accessor_path] {
            let mode = std::fs::metadata(file).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{:?}", file);
        }
    }
}

#[tokio::test]
async fn test_auth_persists_trimmed_credential() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/kubernetes/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth": {"client_token": " s.issued\n", "accessor": "\tacc-issued \n"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let jwt_path = dir.path().join("sa-token");
    std::fs::write(&jwt_path, "abc.def.ghi").unwrap();

    let auth_settings = AuthSettings {
        role: "app".to_string(),
        mount_path: "kubernetes".to_string(),
        identity_token_path: jwt_path,
    };
    let paths = PathSettings {
        token_path: dir.path().join(".vault-token"),
        accessor_path: dir.path().join(".vault-accessor"),
    };

    let client = VaultClient::new(&vault_settings(&mock_server)).unwrap();
    let files = FilePersistence::new();

    let credential = auth::authenticate(&auth_settings, &client, &files).await.unwrap();
    auth::persist_credential(&credential, &paths, &files).await.unwrap();

    assert_eq!(std::fs::read(&paths.token_path).unwrap(), b"s.issued");
    assert_eq!(std::fs::read(&paths.accessor_path).unwrap(), b"acc-issued");
}

#[tokio::test]
async fn test_auth_rejected_writes_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/kubernetes/login"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": ["permission denied"]
        })))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let jwt_path = dir.path().join("sa-token");
    std::fs::write(&jwt_path, "expired.jwt").unwrap();

    let auth_settings = AuthSettings {
        role: "app".to_string(),
        mount_path: "kubernetes".to_string(),
        identity_token_path: jwt_path,
    };

    let client = VaultClient::new(&vault_settings(&mock_server)).unwrap();
    let err = auth::authenticate(&auth_settings, &client, &FilePersistence::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SidevaultError::Auth(_)));
    assert!(err.to_string().starts_with("failed to login"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_renew_cycle_with_persisted_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .and(header("X-Vault-Token", "s.persisted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"creation_ttl": 3600, "ttl": 1799}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/renew-self"))
        .and(header("X-Vault-Token", "s.persisted"))
        .and(body_json(json!({"increment": 3600})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth": {"lease_duration": 3600, "renewable": true}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join(".vault-token");
    std::fs::write(&token_path, "s.persisted\n").unwrap();

    let client = VaultClient::new(&vault_settings(&mock_server)).unwrap();
    let scheduler = RenewalScheduler::new(client, RenewSettings::default());

    scheduler
        .load_token(&token_path, &FilePersistence::new())
        .await
        .unwrap();
    let outcome = scheduler.run_cycle().await.unwrap();

    assert!(matches!(outcome, CycleOutcome::Renewed { lease_increment: 3600, .. }));
}

#[tokio::test]
async fn test_lookup_failure_skips_renewal() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errors": ["internal error"]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/renew-self"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join(".vault-token");
    std::fs::write(&token_path, "s.persisted").unwrap();

    let client = VaultClient::new(&vault_settings(&mock_server)).unwrap();
    let scheduler = RenewalScheduler::new(client, RenewSettings::default());
    scheduler
        .load_token(&token_path, &FilePersistence::new())
        .await
        .unwrap();

    let err = scheduler.run_cycle().await.unwrap_err();
    assert!(matches!(err, SidevaultError::Lookup(_)));
}
