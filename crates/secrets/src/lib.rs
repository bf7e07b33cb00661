//! Secret store contract for boltsync
//!
//! Defines the interface between a secret-synchronization host and the
//! backends that serve secrets to it. A backend ships a
//! [`SecretStoreProvider`], which validates store definitions and builds
//! per-store [`SecretsClient`]s. Clients answer three read shapes:
//!
//! - a single value ([`SecretsClient::get_secret`])
//! - a field map for one record ([`SecretsClient::get_secret_map`])
//! - every record matching a [`FindSpec`] ([`SecretsClient::get_all_secrets`])
//!
//! ```ignore
//! use boltsync_secrets::{ProviderRegistry, RemoteRef};
//!
//! let provider = registry.for_store(&store)?;
//! provider.validate_store(&store)?;
//! let client = provider.new_client(&store).await?;
//! let value = client.get_secret(&RemoteRef::new("resource-id")).await?;
//! client.close().await?;
//! ```

mod refs;
mod registry;
mod store;
mod types;

pub use refs::{FindName, FindSpec, PushRemoteRef, PushSecretData, RemoteRef};
pub use registry::ProviderRegistry;
pub use store::{Capabilities, SecretStore, ValidationResult, Warnings};
pub use types::{SecretMap, SecretValue};

use async_trait::async_trait;
use thiserror::Error;

/// Boxed error carried across the provider boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for secret store operations
#[derive(Debug, Error)]
pub enum SecretError {
    /// The referenced secret does not exist in the backend
    #[error("Secret '{key}' not found")]
    NotFound {
        /// Key that was looked up
        key: String,
    },

    /// A property was requested that the backend record does not expose
    #[error("unsupported property '{property}', expected one of: {supported}")]
    UnsupportedProperty {
        /// Requested property name
        property: String,
        /// Comma separated list of valid property names
        supported: String,
    },

    /// A find predicate other than name matching was requested
    #[error("unsupported find operator: {operator}")]
    UnsupportedFindOperator {
        /// The predicate that was requested
        operator: String,
    },

    /// The name pattern of a find request is not a valid regular expression
    #[error("invalid name pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Pattern as supplied
        pattern: String,
        /// Parser message
        message: String,
    },

    /// Store definition failed validation
    #[error("invalid '{provider}' secret store: {source}")]
    InvalidStore {
        /// Provider that rejected the store
        provider: String,
        /// The specific validation failure
        #[source]
        source: BoxError,
    },

    /// No registered provider matches the store definition
    #[error("Unsupported secret provider: {provider}")]
    UnsupportedProvider {
        /// The provider key found in the store (or a description of the problem)
        provider: String,
    },

    /// Error raised by the backend or its client
    #[error("{provider} backend error: {source}")]
    Provider {
        /// Provider that failed
        provider: &'static str,
        /// Underlying backend error
        #[source]
        source: BoxError,
    },

    /// A resolved record could not be serialized
    #[error("failed to serialize secret '{key}': {source}")]
    Serialization {
        /// Key of the record being serialized
        key: String,
        /// Serializer error
        #[source]
        source: serde_json::Error,
    },
}

impl SecretError {
    /// Wrap a backend error for the given provider.
    pub fn provider(provider: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Provider {
            provider,
            source: source.into(),
        }
    }

    /// Wrap a store validation failure for the given provider.
    pub fn invalid_store(provider: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::InvalidStore {
            provider: provider.into(),
            source: source.into(),
        }
    }
}

/// A client bound to one secret store.
///
/// Clients own whatever backend session they need. Every call may block on
/// network I/O; callers apply their own timeouts by bounding or dropping
/// the returned futures.
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Resolve a single value.
    ///
    /// When `remote_ref.property` is set, exactly that field is returned.
    /// Otherwise the provider returns its full serialized record.
    async fn get_secret(&self, remote_ref: &RemoteRef) -> Result<SecretValue, SecretError>;

    /// Resolve one record into a map of field name to bytes.
    async fn get_secret_map(&self, remote_ref: &RemoteRef) -> Result<SecretMap, SecretError>;

    /// Resolve every record matching `find`, keyed by backend identifier.
    async fn get_all_secrets(&self, find: &FindSpec) -> Result<SecretMap, SecretError>;

    /// Write a secret to the backend.
    async fn push_secret(&self, data: &PushSecretData) -> Result<(), SecretError>;

    /// Remove a previously pushed secret from the backend.
    async fn delete_secret(&self, remote_ref: &PushRemoteRef) -> Result<(), SecretError>;

    /// Report whether the client is ready to serve requests.
    fn validate(&self) -> Result<ValidationResult, SecretError>;

    /// Release the backend session. The client must not be used afterwards.
    async fn close(&self) -> Result<(), SecretError>;
}

/// A secret backend that can be plugged into the host.
///
/// Implementors must provide:
/// - [`provider_name`](SecretStoreProvider::provider_name) - the key of the
///   provider block in a [`SecretStore`]
/// - [`validate_store`](SecretStoreProvider::validate_store) - static config checks
/// - [`new_client`](SecretStoreProvider::new_client) - client construction
#[async_trait]
pub trait SecretStoreProvider: Send + Sync {
    /// Provider identifier, also the key of its block in a store definition.
    ///
    /// Examples: `"passbolt"`, `"fake"`
    fn provider_name(&self) -> &'static str;

    /// Read/write capabilities of the backend.
    fn capabilities(&self) -> Capabilities;

    /// Check a store definition without contacting the backend.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidStore`] naming the offending field.
    fn validate_store(&self, store: &SecretStore) -> Result<Warnings, SecretError>;

    /// Build a client for the given store.
    async fn new_client(&self, store: &SecretStore)
    -> Result<Box<dyn SecretsClient>, SecretError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_error_not_found() {
        let err = SecretError::NotFound {
            key: "/foo".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/foo"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_secret_error_unsupported_property() {
        let err = SecretError::UnsupportedProperty {
            property: "p2".to_string(),
            supported: "name, username".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("unsupported property"));
        assert!(msg.contains("p2"));
        assert!(msg.contains("username"));
    }

    #[test]
    fn test_secret_error_unsupported_find_operator() {
        let err = SecretError::UnsupportedFindOperator {
            operator: "path".to_string(),
        };
        assert!(err.to_string().contains("unsupported find operator"));
    }

    #[test]
    fn test_secret_error_provider_keeps_source() {
        let io = std::io::Error::other("connection reset");
        let err = SecretError::provider("passbolt", io);
        let msg = err.to_string();
        assert!(msg.contains("passbolt"));
        assert!(msg.contains("connection reset"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_secret_error_invalid_store() {
        let err = SecretError::invalid_store("passbolt", "auth is missing");
        let msg = err.to_string();
        assert!(msg.contains("passbolt"));
        assert!(msg.contains("auth is missing"));
    }

    #[test]
    fn test_secret_error_debug() {
        let err = SecretError::UnsupportedProvider {
            provider: "unknown".to_string(),
        };
        let debug = format!("{err:?}");
        assert!(debug.contains("UnsupportedProvider"));
    }
}
