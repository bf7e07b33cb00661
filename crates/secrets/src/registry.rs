//! Secret provider registry
//!
//! Maps provider names to [`SecretStoreProvider`] implementations so the
//! host can pick the backend for a store from its definition alone.

use crate::{SecretError, SecretStore, SecretStoreProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry for secret store providers
///
/// ```ignore
/// use boltsync_secrets::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::new();
/// registry.register(Arc::new(PassboltProvider::new()));
///
/// let provider = registry.for_store(&store)?;
/// let client = provider.new_client(&store).await?;
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn SecretStoreProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider
    ///
    /// The provider's `provider_name()` is used as the key. If a provider
    /// with the same name already exists, it is replaced.
    pub fn register(&mut self, provider: Arc<dyn SecretStoreProvider>) {
        self.providers.insert(provider.provider_name(), provider);
    }

    /// Get a provider by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn SecretStoreProvider>> {
        self.providers.get(name).cloned()
    }

    /// Check if a provider is registered for the given name
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Get all registered provider names, sorted
    #[must_use]
    pub fn providers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.providers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Select the provider responsible for a store
    ///
    /// A store must carry exactly one provider block.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::UnsupportedProvider`] if the store has no
    /// provider block, more than one, or one nobody registered.
    pub fn for_store(
        &self,
        store: &SecretStore,
    ) -> Result<Arc<dyn SecretStoreProvider>, SecretError> {
        let mut keys = store.provider.keys();
        let (Some(name), None) = (keys.next(), keys.next()) else {
            return Err(SecretError::UnsupportedProvider {
                provider: format!(
                    "store '{}' must define exactly one provider, found {}",
                    store.name,
                    store.provider.len()
                ),
            });
        };

        tracing::debug!(store = %store.name, provider = %name, "Selecting secret provider");

        self.get(name)
            .ok_or_else(|| SecretError::UnsupportedProvider {
                provider: name.clone(),
            })
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
