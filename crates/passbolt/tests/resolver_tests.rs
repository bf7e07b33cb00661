//! Resolver behaviour against an in-memory Passbolt

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use boltsync_passbolt::api::{Resource, ResourceType, Secret};
use boltsync_passbolt::{PassboltClient, PassboltError, PassboltSecretsClient};
use boltsync_secrets::{
    FindSpec, PushRemoteRef, PushSecretData, RemoteRef, SecretError, SecretsClient,
    ValidationResult,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

const TYPE_PASSWORD_AND_DESCRIPTION: &str = "t-pad";
const TYPE_PASSWORD_STRING: &str = "t-str";
const TYPE_TOTP: &str = "t-totp";
const TYPE_UNKNOWN: &str = "t-v5";

/// Passbolt double. Ciphertext is the plaintext prefixed with `ENC:`.
#[derive(Default)]
struct FakePassbolt {
    resources: Vec<Resource>,
    types: HashMap<String, ResourceType>,
    secrets: HashMap<String, String>,
    session_live: AtomicBool,
    fail_login: bool,
    fail_logout: bool,
    fail_list: bool,
    calls: AtomicUsize,
    logins: AtomicUsize,
    logouts: AtomicUsize,
}

impl FakePassbolt {
    fn new() -> Self {
        let mut fake = Self::default();
        for (id, slug) in [
            (TYPE_PASSWORD_AND_DESCRIPTION, "password-and-description"),
            (TYPE_PASSWORD_STRING, "password-string"),
            (TYPE_TOTP, "totp"),
            (TYPE_UNKNOWN, "v5-default"),
        ] {
            fake.types.insert(
                id.to_string(),
                ResourceType {
                    id: id.to_string(),
                    slug: slug.to_string(),
                    name: slug.to_string(),
                },
            );
        }
        fake
    }

    fn logged_in(self) -> Self {
        self.session_live.store(true, Ordering::SeqCst);
        self
    }

    fn with_resource(mut self, id: &str, name: &str, type_id: &str, plaintext: &str) -> Self {
        self.resources.push(Resource {
            id: id.to_string(),
            name: name.to_string(),
            username: format!("{name}-user"),
            uri: format!("https://{name}.example"),
            description: String::new(),
            resource_type_id: type_id.to_string(),
            folder_parent_id: None,
        });
        self.secrets
            .insert(id.to_string(), format!("ENC:{plaintext}"));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    fn track(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PassboltClient for FakePassbolt {
    async fn check_session(&self) -> bool {
        self.track();
        self.session_live.load(Ordering::SeqCst)
    }

    async fn login(&self) -> Result<(), PassboltError> {
        self.track();
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.fail_login {
            return Err(PassboltError::Auth("bad passphrase".to_string()));
        }
        self.session_live.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> Result<(), PassboltError> {
        self.track();
        self.logouts.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout {
            return Err(PassboltError::Api {
                status: 500,
                message: "logout failed".to_string(),
            });
        }
        self.session_live.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn get_resource(&self, resource_id: &str) -> Result<Resource, PassboltError> {
        self.track();
        self.resources
            .iter()
            .find(|r| r.id == resource_id)
            .cloned()
            .ok_or_else(|| PassboltError::NotFound(format!("/resources/{resource_id}.json")))
    }

    async fn get_resources(&self) -> Result<Vec<Resource>, PassboltError> {
        self.track();
        if self.fail_list {
            return Err(PassboltError::Network("connection reset".to_string()));
        }
        Ok(self.resources.clone())
    }

    async fn get_resource_type(&self, type_id: &str) -> Result<ResourceType, PassboltError> {
        self.track();
        self.types
            .get(type_id)
            .cloned()
            .ok_or_else(|| PassboltError::NotFound(format!("/resource-types/{type_id}.json")))
    }

    async fn decrypt_message(&self, message: &str) -> Result<String, PassboltError> {
        self.track();
        message
            .strip_prefix("ENC:")
            .map(str::to_string)
            .ok_or_else(|| PassboltError::Decrypt("not encrypted for this key".to_string()))
    }

    async fn get_secret(&self, resource_id: &str) -> Result<Secret, PassboltError> {
        self.track();
        self.secrets
            .get(resource_id)
            .map(|data| Secret {
                id: format!("s-{resource_id}"),
                resource_id: resource_id.to_string(),
                data: data.clone(),
            })
            .ok_or_else(|| PassboltError::NotFound(format!("/secrets/resource/{resource_id}.json")))
    }
}

fn three_keys() -> FakePassbolt {
    FakePassbolt::new()
        .logged_in()
        .with_resource(
            "id-1",
            "some-key1",
            TYPE_PASSWORD_AND_DESCRIPTION,
            r#"{"password":"p1","description":"d1"}"#,
        )
        .with_resource("id-2", "some-key2", TYPE_PASSWORD_STRING, "p2")
        .with_resource(
            "id-3",
            "another-key1",
            TYPE_PASSWORD_AND_DESCRIPTION,
            r#"{"password":"p3","description":"d3"}"#,
        )
}

fn json_of(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap()
}

// ============================================================================
// get_all_secrets
// ============================================================================

#[tokio::test]
async fn test_find_by_name_pattern() {
    let client = PassboltSecretsClient::new(three_keys());
    let secrets = client
        .get_all_secrets(&FindSpec::by_name("some-key.*"))
        .await
        .unwrap();

    assert_eq!(secrets.len(), 2);
    assert!(!secrets.contains("id-3"));

    let first = json_of(secrets.get("id-1").unwrap().expose());
    assert_eq!(
        first,
        serde_json::json!({
            "name": "some-key1",
            "username": "some-key1-user",
            "password": "p1",
            "uri": "https://some-key1.example",
            "description": "d1"
        })
    );

    let second = json_of(secrets.get("id-2").unwrap().expose());
    assert_eq!(second["password"], "p2");
    assert_eq!(second["name"], "some-key2");
}

#[tokio::test]
async fn test_find_without_matches() {
    let client = PassboltSecretsClient::new(FakePassbolt::new().logged_in());
    let secrets = client
        .get_all_secrets(&FindSpec::by_name("some-key"))
        .await
        .unwrap();
    assert!(secrets.is_empty());
}

#[tokio::test]
async fn test_find_empty_pattern_returns_empty_map() {
    let client = PassboltSecretsClient::new(three_keys());

    let secrets = client.get_all_secrets(&FindSpec::by_name("")).await.unwrap();
    assert!(secrets.is_empty());

    let secrets = client.get_all_secrets(&FindSpec::default()).await.unwrap();
    assert!(secrets.is_empty());

    assert_eq!(client.client().calls(), 0);
}

#[tokio::test]
async fn test_find_by_path_unsupported() {
    let client = PassboltSecretsClient::new(three_keys());
    let err = client
        .get_all_secrets(&FindSpec::by_path("some/path"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unsupported find operator"));
}

#[tokio::test]
async fn test_find_by_tags_unsupported() {
    let client = PassboltSecretsClient::new(three_keys());
    let find = FindSpec {
        tags: BTreeMap::from([("env".to_string(), "prod".to_string())]),
        ..FindSpec::by_name("some-key.*")
    };
    let err = client.get_all_secrets(&find).await.unwrap_err();
    assert!(err.to_string().contains("unsupported find operator"));
    assert_eq!(client.client().calls(), 0);
}

#[tokio::test]
async fn test_find_invalid_pattern_makes_no_calls() {
    let client = PassboltSecretsClient::new(three_keys());
    let err = client
        .get_all_secrets(&FindSpec::by_name("some-key(["))
        .await
        .unwrap_err();

    match err {
        SecretError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "some-key(["),
        other => panic!("Expected InvalidPattern, got {other:?}"),
    }
    assert_eq!(client.client().calls(), 0);
}

#[tokio::test]
async fn test_find_aborts_on_single_failure() {
    let client = PassboltSecretsClient::new(three_keys().with_resource(
        "id-4",
        "some-key4",
        TYPE_UNKNOWN,
        "whatever",
    ));
    let err = client
        .get_all_secrets(&FindSpec::by_name("some-key.*"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("v5-default"));
}

#[tokio::test]
async fn test_find_propagates_list_failure() {
    let mut fake = three_keys();
    fake.fail_list = true;
    let client = PassboltSecretsClient::new(fake);
    let err = client
        .get_all_secrets(&FindSpec::by_name(".*"))
        .await
        .unwrap_err();
    assert!(matches!(err, SecretError::Provider { provider: "passbolt", .. }));
}

// ============================================================================
// get_secret
// ============================================================================

#[tokio::test]
async fn test_get_secret_not_found() {
    let client = PassboltSecretsClient::new(three_keys());
    let err = client
        .get_secret(&RemoteRef::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, SecretError::NotFound { ref key } if key == "missing"));
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_get_secret_full_record() {
    let client = PassboltSecretsClient::new(three_keys());
    let value = client.get_secret(&RemoteRef::new("id-1")).await.unwrap();
    let record = json_of(value.expose());
    assert_eq!(record["name"], "some-key1");
    assert_eq!(record["password"], "p1");
    assert_eq!(record["description"], "d1");
}

#[tokio::test]
async fn test_get_secret_property() {
    let client = PassboltSecretsClient::new(three_keys());

    let password = client
        .get_secret(&RemoteRef::with_property("id-1", "password"))
        .await
        .unwrap();
    assert_eq!(password.expose(), b"p1");

    let username = client
        .get_secret(&RemoteRef::with_property("id-1", "username"))
        .await
        .unwrap();
    assert_eq!(username.expose(), b"some-key1-user");

    let folder = client
        .get_secret(&RemoteRef::with_property("id-1", "folderParentId"))
        .await
        .unwrap();
    assert!(folder.is_empty());
}

#[tokio::test]
async fn test_get_secret_unsupported_property() {
    let client = PassboltSecretsClient::new(three_keys());
    let err = client
        .get_secret(&RemoteRef::with_property("id-1", "totp"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unsupported property"));
}

#[tokio::test]
async fn test_get_secret_decrypt_failure() {
    let mut fake = three_keys();
    fake.secrets
        .insert("id-1".to_string(), "garbage".to_string());
    let client = PassboltSecretsClient::new(fake);
    let err = client.get_secret(&RemoteRef::new("id-1")).await.unwrap_err();
    assert!(err.to_string().contains("decrypt"));
}

// ============================================================================
// get_secret_map
// ============================================================================

#[tokio::test]
async fn test_get_secret_map() {
    let client = PassboltSecretsClient::new(three_keys());
    let map = client.get_secret_map(&RemoteRef::new("id-1")).await.unwrap();

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    assert_eq!(
        keys,
        ["description", "folderParentId", "name", "password", "uri", "username"]
    );
    assert_eq!(map.get("password").unwrap().expose(), b"p1");
    assert_eq!(map.get("description").unwrap().expose(), b"d1");
    assert!(map.get("folderParentId").unwrap().is_empty());
}

#[tokio::test]
async fn test_get_secret_map_propagates_errors() {
    let client = PassboltSecretsClient::new(three_keys());
    let err = client
        .get_secret_map(&RemoteRef::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, SecretError::NotFound { .. }));
}

// ============================================================================
// Resource type dispatch
// ============================================================================

#[tokio::test]
async fn test_dispatch_password_and_description() {
    let fake = FakePassbolt::new().logged_in().with_resource(
        "r",
        "n",
        TYPE_PASSWORD_AND_DESCRIPTION,
        r#"{"password":"x","description":"y"}"#,
    );
    let map = PassboltSecretsClient::new(fake)
        .get_secret_map(&RemoteRef::new("r"))
        .await
        .unwrap();
    assert_eq!(map.get("password").unwrap().expose(), b"x");
    assert_eq!(map.get("description").unwrap().expose(), b"y");
}

#[tokio::test]
async fn test_dispatch_password_string() {
    let fake = FakePassbolt::new().logged_in().with_resource(
        "r",
        "n",
        TYPE_PASSWORD_STRING,
        "plain text password",
    );
    let value = PassboltSecretsClient::new(fake)
        .get_secret(&RemoteRef::with_property("r", "password"))
        .await
        .unwrap();
    assert_eq!(value.expose(), b"plain text password");
}

#[tokio::test]
async fn test_dispatch_totp() {
    let fake = FakePassbolt::new().logged_in().with_resource(
        "r",
        "n",
        TYPE_TOTP,
        r#"{"totp":{"secret_key":"JBSWY3DPEHPK3PXP"}}"#,
    );
    let value = PassboltSecretsClient::new(fake)
        .get_secret(&RemoteRef::with_property("r", "password"))
        .await
        .unwrap();
    assert!(value.is_empty());
}

#[tokio::test]
async fn test_dispatch_unknown_type() {
    let fake = FakePassbolt::new()
        .logged_in()
        .with_resource("r", "n", TYPE_UNKNOWN, "x");
    let err = PassboltSecretsClient::new(fake)
        .get_secret(&RemoteRef::new("r"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("v5-default"));
}

// ============================================================================
// Writes, validation and teardown
// ============================================================================

#[tokio::test]
async fn test_push_and_delete_are_noops() {
    let client = PassboltSecretsClient::new(three_keys());

    let data = PushSecretData {
        secret_key: Some("password".to_string()),
        remote_ref: PushRemoteRef {
            remote_key: "id-1".to_string(),
            property: None,
        },
    };
    client.push_secret(&data).await.unwrap();
    client.delete_secret(&data.remote_ref).await.unwrap();

    assert_eq!(client.client().calls(), 0);
}

#[test]
fn test_validate_is_unknown() {
    let client = PassboltSecretsClient::new(FakePassbolt::new());
    assert_eq!(client.validate().unwrap(), ValidationResult::Unknown);
}

#[tokio::test]
async fn test_close_logs_out() {
    let client = PassboltSecretsClient::new(three_keys());
    client.close().await.unwrap();
    assert_eq!(client.client().logouts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_close_surfaces_logout_failure() {
    let mut fake = three_keys();
    fake.fail_logout = true;
    let client = PassboltSecretsClient::new(fake);
    let err = client.close().await.unwrap_err();
    assert!(err.to_string().contains("logout failed"));
}

// ============================================================================
// Session assurance
// ============================================================================

#[tokio::test]
async fn test_live_session_skips_login() {
    let client = PassboltSecretsClient::new(three_keys());
    client.get_secret(&RemoteRef::new("id-1")).await.unwrap();
    assert_eq!(client.client().logins(), 0);
}

#[tokio::test]
async fn test_expired_session_logs_in() {
    let fake = three_keys();
    fake.session_live.store(false, Ordering::SeqCst);
    let client = PassboltSecretsClient::new(fake);

    client.get_secret(&RemoteRef::new("id-1")).await.unwrap();
    client.get_secret(&RemoteRef::new("id-2")).await.unwrap();
    assert_eq!(client.client().logins(), 1);
}

#[tokio::test]
async fn test_login_failure_propagates() {
    let mut fake = three_keys();
    fake.session_live.store(false, Ordering::SeqCst);
    fake.fail_login = true;
    let client = PassboltSecretsClient::new(fake);

    let err = client
        .get_all_secrets(&FindSpec::by_name(".*"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("bad passphrase"));
    assert_eq!(client.client().logins(), 1);
}

#[tokio::test]
async fn test_concurrent_reads_log_in_once() {
    let fake = three_keys();
    fake.session_live.store(false, Ordering::SeqCst);
    let client = Arc::new(PassboltSecretsClient::new(fake));
    let reference = RemoteRef::with_property("id-1", "password");

    let results =
        futures::future::join_all((0..8).map(|_| client.get_secret(&reference))).await;

    for result in results {
        assert_eq!(result.unwrap().expose(), b"p1");
    }
    assert_eq!(client.client().logins(), 1);
}
