//! Capability interface to a Passbolt server

use crate::api::{Resource, ResourceType, Secret};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while talking to Passbolt or interpreting its data
#[derive(Debug, Error)]
pub enum PassboltError {
    /// Transport level failure
    #[error("request to Passbolt failed: {0}")]
    Network(String),

    /// The server rejected the session (HTTP 401)
    #[error("Passbolt session expired or missing")]
    SessionExpired,

    /// The user may not access the entity (HTTP 403)
    #[error("access denied by Passbolt: {0}")]
    Forbidden(String),

    /// The entity does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("Passbolt API returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or server message
        message: String,
    },

    /// A response or payload could not be decoded
    #[error("failed to parse Passbolt data: {0}")]
    Parse(String),

    /// Login was refused or the handshake was incomplete
    #[error("Passbolt authentication failed: {0}")]
    Auth(String),

    /// OpenPGP decryption failed
    #[error("failed to decrypt Passbolt message: {0}")]
    Decrypt(String),

    /// The resource uses a type this backend cannot interpret
    #[error("unknown Passbolt resource type '{slug}'")]
    UnknownResourceType {
        /// Slug reported by the server
        slug: String,
    },
}

impl PassboltError {
    /// Whether the error means the requested entity does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Operations the secret backend needs from a Passbolt client.
///
/// [`HttpPassboltClient`](crate::HttpPassboltClient) implements this over
/// the REST API; tests substitute an in-memory fake.
///
/// `login` is not safe to run concurrently with itself; callers serialize
/// it (see [`PassboltSecretsClient`](crate::PassboltSecretsClient)).
#[async_trait]
pub trait PassboltClient: Send + Sync {
    /// Whether the current session is still accepted by the server.
    async fn check_session(&self) -> bool;

    /// Establish a new session.
    async fn login(&self) -> Result<(), PassboltError>;

    /// Terminate the current session.
    async fn logout(&self) -> Result<(), PassboltError>;

    /// Fetch one resource by ID.
    async fn get_resource(&self, resource_id: &str) -> Result<Resource, PassboltError>;

    /// List every resource visible to the user.
    async fn get_resources(&self) -> Result<Vec<Resource>, PassboltError>;

    /// Fetch a resource type by ID.
    async fn get_resource_type(&self, type_id: &str) -> Result<ResourceType, PassboltError>;

    /// Decrypt an armored OpenPGP message with the user's key.
    async fn decrypt_message(&self, message: &str) -> Result<String, PassboltError>;

    /// Fetch the user's encrypted secret for a resource.
    async fn get_secret(&self, resource_id: &str) -> Result<Secret, PassboltError>;
}
