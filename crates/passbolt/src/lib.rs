//! Passbolt integration for boltsync
//!
//! This crate serves Passbolt resources through the
//! [`boltsync_secrets`] store contract:
//! - [`PassboltProvider`] validates store definitions and builds clients
//! - [`PassboltSecretsClient`] resolves references into record fields
//! - [`PassboltClient`] is the narrow capability interface to the server,
//!   implemented over HTTP by [`HttpPassboltClient`]
//! - [`GpgDecryptor`] decrypts secret payloads with the `gpg` CLI

pub mod api;
pub mod client;
pub mod config;
pub mod gpg;
pub mod http;
mod provider;
pub mod secrets;

// Re-export main types for convenience
pub use client::{PassboltClient, PassboltError};
pub use config::{ConfigError, PassboltAuth, PassboltProviderConfig};
pub use gpg::{Decryptor, GpgDecryptor};
pub use http::HttpPassboltClient;
pub use provider::{PROVIDER_NAME, PassboltProvider};
pub use secrets::{PassboltSecret, PassboltSecretsClient};
