//! [`SecretsClient`] implementation over a [`PassboltClient`]

use super::record::PassboltSecret;
use crate::api::{Resource, ResourceKind};
use crate::client::{PassboltClient, PassboltError};
use crate::provider::PROVIDER_NAME;
use async_trait::async_trait;
use boltsync_secrets::{
    FindSpec, PushRemoteRef, PushSecretData, RemoteRef, SecretError, SecretMap, SecretValue,
    SecretsClient, ValidationResult,
};
use regex::Regex;
use tokio::sync::Mutex;

/// Serves Passbolt resources to the host.
///
/// The instance owns one logical session. Every read first makes sure the
/// session is live, logging in when it is not; the check and the login
/// run under a single gate so concurrent reads never log in twice.
pub struct PassboltSecretsClient<C> {
    client: C,
    login_gate: Mutex<()>,
}

impl<C> std::fmt::Debug for PassboltSecretsClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassboltSecretsClient").finish_non_exhaustive()
    }
}

impl<C: PassboltClient> PassboltSecretsClient<C> {
    /// Wrap a Passbolt client.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            login_gate: Mutex::new(()),
        }
    }

    /// The underlying Passbolt client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    async fn ensure_session(&self) -> Result<(), SecretError> {
        let _gate = self.login_gate.lock().await;

        if self.client.check_session().await {
            return Ok(());
        }

        tracing::debug!("No live Passbolt session, logging in");
        self.client.login().await.map_err(backend_error)
    }

    /// Fetch a resource by ID and resolve it.
    async fn fetch_secret(&self, resource_id: &str) -> Result<PassboltSecret, PassboltError> {
        let resource = self.client.get_resource(resource_id).await?;
        self.resolve(&resource).await
    }

    /// Look up the resource type, decrypt the secret and merge both.
    async fn resolve(&self, resource: &Resource) -> Result<PassboltSecret, PassboltError> {
        let resource_type = self
            .client
            .get_resource_type(&resource.resource_type_id)
            .await?;
        let kind: ResourceKind = resource_type.slug.parse()?;

        let secret = self.client.get_secret(&resource.id).await?;
        let plaintext = self.client.decrypt_message(&secret.data).await?;

        tracing::trace!(resource = %resource.id, kind = %kind, "Decrypted Passbolt secret");
        PassboltSecret::from_plaintext(resource, kind, &plaintext)
    }

    async fn read_record(&self, key: &str) -> Result<PassboltSecret, SecretError> {
        self.ensure_session().await?;
        self.fetch_secret(key)
            .await
            .map_err(|e| lookup_error(key, e))
    }
}

#[async_trait]
impl<C: PassboltClient> SecretsClient for PassboltSecretsClient<C> {
    async fn get_secret(&self, remote_ref: &RemoteRef) -> Result<SecretValue, SecretError> {
        tracing::debug!(
            key = %remote_ref.key,
            property = remote_ref.property.as_deref(),
            "Resolving Passbolt secret"
        );

        let record = self.read_record(&remote_ref.key).await?;
        match remote_ref.property.as_deref() {
            Some(property) => record.property(property).map(SecretValue::from),
            None => record.to_json(&remote_ref.key).map(SecretValue::new),
        }
    }

    async fn get_secret_map(&self, remote_ref: &RemoteRef) -> Result<SecretMap, SecretError> {
        tracing::debug!(key = %remote_ref.key, "Resolving Passbolt secret map");

        let record = self.read_record(&remote_ref.key).await?;
        Ok(record.to_secret_map())
    }

    async fn get_all_secrets(&self, find: &FindSpec) -> Result<SecretMap, SecretError> {
        if find.path.is_some() {
            return Err(SecretError::UnsupportedFindOperator {
                operator: "path".to_string(),
            });
        }
        if !find.tags.is_empty() {
            return Err(SecretError::UnsupportedFindOperator {
                operator: "tags".to_string(),
            });
        }

        let Some(pattern) = find.name_pattern() else {
            return Ok(SecretMap::new());
        };
        let matcher = Regex::new(pattern).map_err(|e| SecretError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        self.ensure_session().await?;
        let resources = self.client.get_resources().await.map_err(backend_error)?;

        let mut secrets = SecretMap::new();
        for resource in resources.iter().filter(|r| matcher.is_match(&r.name)) {
            let record = self
                .resolve(resource)
                .await
                .map_err(|e| lookup_error(&resource.id, e))?;
            secrets.insert(resource.id.clone(), record.to_json(&resource.id)?);
        }

        tracing::debug!(
            pattern,
            listed = resources.len(),
            matched = secrets.len(),
            "Resolved Passbolt secrets by name"
        );
        Ok(secrets)
    }

    async fn push_secret(&self, data: &PushSecretData) -> Result<(), SecretError> {
        tracing::debug!(
            remote_key = %data.remote_ref.remote_key,
            "Passbolt store is read-only, ignoring push"
        );
        Ok(())
    }

    async fn delete_secret(&self, remote_ref: &PushRemoteRef) -> Result<(), SecretError> {
        tracing::debug!(
            remote_key = %remote_ref.remote_key,
            "Passbolt store is read-only, ignoring delete"
        );
        Ok(())
    }

    fn validate(&self) -> Result<ValidationResult, SecretError> {
        Ok(ValidationResult::Unknown)
    }

    async fn close(&self) -> Result<(), SecretError> {
        self.client.logout().await.map_err(backend_error)
    }
}

fn backend_error(error: PassboltError) -> SecretError {
    SecretError::provider(PROVIDER_NAME, error)
}

fn lookup_error(key: &str, error: PassboltError) -> SecretError {
    if error.is_not_found() {
        SecretError::NotFound {
            key: key.to_string(),
        }
    } else {
        backend_error(error)
    }
}
