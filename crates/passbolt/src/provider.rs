//! Passbolt [`SecretStoreProvider`]

use crate::config::{ConfigError, PassboltProviderConfig};
use crate::gpg::GpgDecryptor;
use crate::http::HttpPassboltClient;
use crate::secrets::PassboltSecretsClient;
use async_trait::async_trait;
use boltsync_secrets::{
    Capabilities, SecretError, SecretStore, SecretStoreProvider, SecretsClient, Warnings,
};
use std::sync::Arc;

/// Key of the Passbolt block in a store definition.
pub const PROVIDER_NAME: &str = "passbolt";

/// Read-only secret backend for Passbolt servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassboltProvider;

impl PassboltProvider {
    /// Create the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn config(store: &SecretStore) -> Result<PassboltProviderConfig, SecretError> {
        let config = store
            .provider_config::<PassboltProviderConfig>(PROVIDER_NAME)?
            .ok_or_else(|| invalid(ConfigError::ProviderMissing))?;
        config.validate().map_err(invalid)?;
        Ok(config)
    }
}

#[async_trait]
impl SecretStoreProvider for PassboltProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ReadOnly
    }

    fn validate_store(&self, store: &SecretStore) -> Result<Warnings, SecretError> {
        Self::config(store)?;
        Ok(Warnings::new())
    }

    async fn new_client(
        &self,
        store: &SecretStore,
    ) -> Result<Box<dyn SecretsClient>, SecretError> {
        let config = Self::config(store)?;
        let host = config.host_url().map_err(invalid)?;
        let auth = config
            .auth
            .as_ref()
            .ok_or_else(|| invalid(ConfigError::AuthMissing))?;

        let decryptor = GpgDecryptor::import(&auth.private_key, &auth.password)
            .await
            .map_err(|e| SecretError::provider(PROVIDER_NAME, e))?;
        let client = HttpPassboltClient::new(&host, Arc::new(decryptor))
            .map_err(|e| SecretError::provider(PROVIDER_NAME, e))?;

        tracing::debug!(store = %store.name, host = %host, "Created Passbolt client");
        Ok(Box::new(PassboltSecretsClient::new(client)))
    }
}

fn invalid(error: ConfigError) -> SecretError {
    SecretError::invalid_store(PROVIDER_NAME, error)
}
