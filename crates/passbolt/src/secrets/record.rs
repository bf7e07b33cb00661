//! The flattened record served for one Passbolt resource

use crate::api::{PasswordAndDescription, Resource, ResourceKind};
use crate::client::PassboltError;
use boltsync_secrets::{SecretError, SecretMap};
use serde::Serialize;

/// Property names accepted by [`PassboltSecret::property`].
pub const SUPPORTED_PROPERTIES: [&str; 6] = [
    "name",
    "username",
    "uri",
    "password",
    "description",
    "folderParentId",
];

/// A resource merged with its decrypted secret.
///
/// Serializes with lower-camel keys; `folderParentId` is omitted when the
/// resource is not in a folder.
#[derive(Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PassboltSecret {
    /// Display name
    pub name: String,
    /// Login name
    pub username: String,
    /// Decrypted password
    pub password: String,
    /// Associated URI
    pub uri: String,
    /// Description, decrypted for structured resource types
    pub description: String,
    /// Containing folder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_parent_id: Option<String>,
}

impl std::fmt::Debug for PassboltSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassboltSecret")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("uri", &self.uri)
            .field("folder_parent_id", &self.folder_parent_id)
            .finish_non_exhaustive()
    }
}

impl PassboltSecret {
    /// Combine a resource with the plaintext of its secret.
    ///
    /// # Errors
    ///
    /// Returns [`PassboltError::Parse`] when a structured payload is not
    /// valid JSON.
    pub fn from_plaintext(
        resource: &Resource,
        kind: ResourceKind,
        plaintext: &str,
    ) -> Result<Self, PassboltError> {
        let mut secret = Self {
            name: resource.name.clone(),
            username: resource.username.clone(),
            password: String::new(),
            uri: resource.uri.clone(),
            description: resource.description.clone(),
            folder_parent_id: resource.folder_parent_id.clone(),
        };

        match kind {
            ResourceKind::PasswordString => {
                secret.password = plaintext.to_string();
            }
            ResourceKind::PasswordAndDescription | ResourceKind::PasswordDescriptionTotp => {
                let payload: PasswordAndDescription = serde_json::from_str(plaintext)
                    .map_err(|e| {
                        PassboltError::Parse(format!("{kind} payload of '{}': {e}", resource.id))
                    })?;
                secret.password = payload.password;
                secret.description = payload.description;
            }
            ResourceKind::Totp => {}
        }

        Ok(secret)
    }

    /// A single field by its serialized name.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::UnsupportedProperty`] for any name outside
    /// [`SUPPORTED_PROPERTIES`].
    pub fn property(&self, property: &str) -> Result<&str, SecretError> {
        match property {
            "name" => Ok(&self.name),
            "username" => Ok(&self.username),
            "uri" => Ok(&self.uri),
            "password" => Ok(&self.password),
            "description" => Ok(&self.description),
            "folderParentId" => Ok(self.folder_parent_id.as_deref().unwrap_or_default()),
            other => Err(SecretError::UnsupportedProperty {
                property: other.to_string(),
                supported: SUPPORTED_PROPERTIES.join(", "),
            }),
        }
    }

    /// Every supported property as a field map. Absent fields map to
    /// empty values.
    #[must_use]
    pub fn to_secret_map(&self) -> SecretMap {
        let mut map = SecretMap::with_capacity(SUPPORTED_PROPERTIES.len());
        for property in SUPPORTED_PROPERTIES {
            if let Ok(value) = self.property(property) {
                map.insert(property, value);
            }
        }
        map
    }

    /// JSON encoding of the whole record.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Serialization`] if encoding fails.
    pub fn to_json(&self, key: &str) -> Result<Vec<u8>, SecretError> {
        serde_json::to_vec(self).map_err(|source| SecretError::Serialization {
            key: key.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> Resource {
        Resource {
            id: "r1".to_string(),
            name: "apache".to_string(),
            username: "www-data".to_string(),
            uri: "www.apache.local".to_string(),
            description: "legacy description".to_string(),
            resource_type_id: "t1".to_string(),
            folder_parent_id: None,
        }
    }

    #[test]
    fn test_password_and_description() {
        let secret = PassboltSecret::from_plaintext(
            &resource(),
            ResourceKind::PasswordAndDescription,
            r#"{"password":"x","description":"y"}"#,
        )
        .unwrap();
        assert_eq!(secret.password, "x");
        assert_eq!(secret.description, "y");
        assert_eq!(secret.name, "apache");
    }

    #[test]
    fn test_password_description_totp() {
        let secret = PassboltSecret::from_plaintext(
            &resource(),
            ResourceKind::PasswordDescriptionTotp,
            r#"{"password":"x","totp":{"secret_key":"JBSWY3DP"}}"#,
        )
        .unwrap();
        assert_eq!(secret.password, "x");
        assert_eq!(secret.description, "");
    }

    #[test]
    fn test_password_string_is_verbatim() {
        let secret = PassboltSecret::from_plaintext(
            &resource(),
            ResourceKind::PasswordString,
            "{not json} s3cr3t",
        )
        .unwrap();
        assert_eq!(secret.password, "{not json} s3cr3t");
        assert_eq!(secret.description, "legacy description");
    }

    #[test]
    fn test_totp_has_no_password() {
        let secret =
            PassboltSecret::from_plaintext(&resource(), ResourceKind::Totp, r#"{"totp":{}}"#)
                .unwrap();
        assert_eq!(secret.password, "");
    }

    #[test]
    fn test_malformed_payload() {
        let err = PassboltSecret::from_plaintext(
            &resource(),
            ResourceKind::PasswordAndDescription,
            "not json",
        )
        .unwrap_err();
        assert!(matches!(err, PassboltError::Parse(_)));
    }

    #[test]
    fn test_property_lookup() {
        let secret = PassboltSecret {
            name: "n".to_string(),
            password: "p".to_string(),
            folder_parent_id: Some("f1".to_string()),
            ..PassboltSecret::default()
        };
        assert_eq!(secret.property("name").unwrap(), "n");
        assert_eq!(secret.property("password").unwrap(), "p");
        assert_eq!(secret.property("folderParentId").unwrap(), "f1");
        assert_eq!(secret.property("uri").unwrap(), "");
    }

    #[test]
    fn test_unsupported_property() {
        let err = PassboltSecret::default().property("totp").unwrap_err();
        assert!(err.to_string().contains("unsupported property"));
    }

    #[test]
    fn test_json_omits_missing_folder() {
        let secret = PassboltSecret {
            name: "n".to_string(),
            ..PassboltSecret::default()
        };
        let json: serde_json::Value = serde_json::from_slice(&secret.to_json("k").unwrap()).unwrap();
        assert_eq!(json["name"], "n");
        assert!(json.get("folderParentId").is_none());
        assert_eq!(
            json.as_object().unwrap().len(),
            5,
            "expected name, username, password, uri, description"
        );
    }

    #[test]
    fn test_json_includes_folder() {
        let secret = PassboltSecret {
            folder_parent_id: Some("f1".to_string()),
            ..PassboltSecret::default()
        };
        let json: serde_json::Value = serde_json::from_slice(&secret.to_json("k").unwrap()).unwrap();
        assert_eq!(json["folderParentId"], "f1");
    }

    #[test]
    fn test_secret_map_has_fixed_keys() {
        let map = PassboltSecret {
            password: "p".to_string(),
            ..PassboltSecret::default()
        }
        .to_secret_map();
        assert_eq!(map.len(), SUPPORTED_PROPERTIES.len());
        assert_eq!(map.get("password").unwrap().expose(), b"p");
        assert!(map.get("folderParentId").unwrap().is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let secret = PassboltSecret {
            password: "hunter2".to_string(),
            ..PassboltSecret::default()
        };
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
