//! Passbolt store configuration and its static validation

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use url::Url;

/// Validation failures of a Passbolt store block.
///
/// Each variant names exactly one missing or invalid field so operators
/// can fix the store without reading logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The store has no `passbolt` provider block
    #[error("PassboltProviderMissing: store has no 'passbolt' provider block")]
    ProviderMissing,

    /// `auth` is absent
    #[error("PassboltAuthMissing: 'auth' is required")]
    AuthMissing,

    /// `auth.password` is empty
    #[error("PassboltAuthPasswordMissing: 'auth.password' is required")]
    PasswordMissing,

    /// `auth.privateKey` is empty
    #[error("PassboltAuthPrivateKeyMissing: 'auth.privateKey' is required")]
    PrivateKeyMissing,

    /// `host` is empty
    #[error("PassboltHostMissing: 'host' is required")]
    HostMissing,

    /// `host` is not a URL
    #[error("PassboltHostMalformedURL: 'host' is not a valid URL ({0})")]
    HostMalformedUrl(String),

    /// `host` does not use TLS
    #[error("PassboltHostSchemeNotHttps: 'host' must use https, got '{0}'")]
    HostSchemeNotHttps(String),
}

/// Credentials used to log in to Passbolt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassboltAuth {
    /// Passphrase of the private key
    #[serde(default = "empty_secret", deserialize_with = "secret_string")]
    pub password: SecretString,

    /// Armored OpenPGP private key of the Passbolt user
    #[serde(default = "empty_secret", deserialize_with = "secret_string")]
    pub private_key: SecretString,
}

impl PassboltAuth {
    /// Create credentials from a passphrase and an armored private key
    #[must_use]
    pub fn new(password: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            password: SecretString::from(password.into()),
            private_key: SecretString::from(private_key.into()),
        }
    }
}

/// The `passbolt` block of a secret store.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassboltProviderConfig {
    /// Authentication material
    #[serde(default)]
    pub auth: Option<PassboltAuth>,

    /// Base URL of the Passbolt server
    #[serde(default)]
    pub host: String,
}

impl PassboltProviderConfig {
    /// Create a config for `host` with the given credentials
    #[must_use]
    pub fn new(host: impl Into<String>, auth: PassboltAuth) -> Self {
        Self {
            auth: Some(auth),
            host: host.into(),
        }
    }

    /// Check the config without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of the first missing or invalid field,
    /// checking credentials before the host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth = self.auth.as_ref().ok_or(ConfigError::AuthMissing)?;

        if auth.password.expose_secret().is_empty() {
            return Err(ConfigError::PasswordMissing);
        }
        if auth.private_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::PrivateKeyMissing);
        }

        self.host_url().map(|_| ())
    }

    /// Parse and check the host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HostMissing`], [`ConfigError::HostMalformedUrl`]
    /// or [`ConfigError::HostSchemeNotHttps`].
    pub fn host_url(&self) -> Result<Url, ConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::HostMissing);
        }

        let url = Url::parse(host).map_err(|e| ConfigError::HostMalformedUrl(e.to_string()))?;
        if url.scheme() != "https" {
            return Err(ConfigError::HostSchemeNotHttps(url.scheme().to_string()));
        }
        Ok(url)
    }
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
        .map(Option::unwrap_or_default)
        .map(SecretString::from)
}
