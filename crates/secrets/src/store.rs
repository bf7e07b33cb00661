//! Store definitions and provider capability declarations

use crate::SecretError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Non-fatal findings from store validation
pub type Warnings = Vec<String>;

/// A secret store definition as handed over by the host.
///
/// The `provider` block holds exactly one entry whose key names the
/// backend, e.g. `{"passbolt": {...}}`. The value is left untyped here and
/// decoded by the owning provider via [`SecretStore::provider_config`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecretStore {
    /// Store name
    pub name: String,

    /// Namespace of a namespaced store; `None` for cluster-wide stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Provider key -> provider specific configuration
    #[serde(default)]
    pub provider: BTreeMap<String, serde_json::Value>,
}

impl SecretStore {
    /// Create a store with a single provider block
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(provider.into(), config);
        Self {
            name: name.into(),
            namespace: None,
            provider: providers,
        }
    }

    /// Decode the block for `provider`.
    ///
    /// Returns `Ok(None)` when the store has no block for that provider.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidStore`] when the block does not match `T`.
    pub fn provider_config<T: DeserializeOwned>(
        &self,
        provider: &str,
    ) -> Result<Option<T>, SecretError> {
        self.provider
            .get(provider)
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|e| SecretError::invalid_store(provider, e))
            })
            .transpose()
    }
}

/// What a backend can do with secrets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Capabilities {
    /// Secrets can only be read
    ReadOnly,
    /// Secrets can only be written
    WriteOnly,
    /// Secrets can be read and written
    ReadWrite,
}

impl Capabilities {
    /// Whether reads are supported
    #[must_use]
    pub const fn can_read(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }
}

/// Outcome of a client readiness check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationResult {
    /// The client reached its backend
    Ready,
    /// Readiness cannot be determined without a real request
    Unknown,
    /// The client is known to be broken
    Error,
}
