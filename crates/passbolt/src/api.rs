//! Passbolt API data model
//!
//! Only the fields the secret backend reads are modelled; everything else
//! in the server's JSON is ignored.

use crate::client::PassboltError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Standard Passbolt response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Response metadata
    pub header: ApiHeader,
    /// Payload
    pub body: T,
}

/// Header block of the response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiHeader {
    /// `"success"` or `"error"`
    #[serde(default)]
    pub status: String,
    /// Human readable server message
    #[serde(default)]
    pub message: String,
}

impl ApiHeader {
    /// Whether the server reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// A password-manager entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    /// Resource UUID
    pub id: String,
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Login name stored with the entry
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    /// Associated URI
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
    /// Cleartext description (legacy resource types keep it here)
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Reference to the [`ResourceType`] describing the secret payload
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_type_id: String,
    /// Folder containing the resource, if any
    #[serde(default)]
    pub folder_parent_id: Option<String>,
}

/// Classification record of a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceType {
    /// Resource type UUID
    pub id: String,
    /// Machine readable slug, e.g. `password-and-description`
    pub slug: String,
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// The encrypted payload attached to a resource for the current user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Secret {
    /// Secret UUID
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Owning resource UUID
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_id: String,
    /// Armored OpenPGP message
    pub data: String,
}

/// Decrypted payload of structured resource types.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PasswordAndDescription {
    /// Password
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
    /// Encrypted description
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Closed set of resource types the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `password-string`: the decrypted payload is the password itself
    PasswordString,
    /// `password-and-description`: JSON with password and description
    PasswordAndDescription,
    /// `password-description-totp`: JSON with password, description and TOTP
    PasswordDescriptionTotp,
    /// `totp`: TOTP only, no password
    Totp,
}

impl ResourceKind {
    /// The slug used by the server.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::PasswordString => "password-string",
            Self::PasswordAndDescription => "password-and-description",
            Self::PasswordDescriptionTotp => "password-description-totp",
            Self::Totp => "totp",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = PassboltError;

    fn from_str(slug: &str) -> Result<Self, Self::Err> {
        match slug {
            "password-string" => Ok(Self::PasswordString),
            "password-and-description" => Ok(Self::PasswordAndDescription),
            "password-description-totp" => Ok(Self::PasswordDescriptionTotp),
            "totp" => Ok(Self::Totp),
            other => Err(PassboltError::UnknownResourceType {
                slug: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
