//! Request shapes sent by the host to a [`SecretsClient`](crate::SecretsClient)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to a single remote secret
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRef {
    /// Backend key (for Passbolt, the resource ID)
    pub key: String,

    /// Optional field of the record to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl RemoteRef {
    /// Reference a whole record
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            property: None,
        }
    }

    /// Reference one property of a record
    #[must_use]
    pub fn with_property(key: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            property: Some(property.into()),
        }
    }
}

/// Name predicate of a [`FindSpec`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FindName {
    /// Regular expression matched against the record's display name
    #[serde(default)]
    pub regexp: String,
}

/// Bulk lookup request
///
/// Only one predicate family is meaningful per provider; providers reject
/// the ones they cannot evaluate with
/// [`SecretError::UnsupportedFindOperator`](crate::SecretError::UnsupportedFindOperator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FindSpec {
    /// Match on record name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<FindName>,

    /// Match on a path prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Match on tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl FindSpec {
    /// Find by name regular expression
    #[must_use]
    pub fn by_name(regexp: impl Into<String>) -> Self {
        Self {
            name: Some(FindName {
                regexp: regexp.into(),
            }),
            ..Self::default()
        }
    }

    /// Find by path prefix
    #[must_use]
    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// The name pattern, if one was given and is non-empty
    #[must_use]
    pub fn name_pattern(&self) -> Option<&str> {
        self.name
            .as_ref()
            .map(|n| n.regexp.as_str())
            .filter(|re| !re.is_empty())
    }
}

/// Remote location targeted by a push or delete
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PushRemoteRef {
    /// Backend key to write to
    pub remote_key: String,

    /// Optional property within the remote record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

/// A single push instruction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PushSecretData {
    /// Key of the local secret entry to push; `None` pushes the whole secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Where to write it
    pub remote_ref: PushRemoteRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_ref_new() {
        let r = RemoteRef::new("abc");
        assert_eq!(r.key, "abc");
        assert!(r.property.is_none());
    }

    #[test]
    fn test_remote_ref_with_property() {
        let r = RemoteRef::with_property("abc", "username");
        assert_eq!(r.property.as_deref(), Some("username"));
    }

    #[test]
    fn test_find_spec_name_pattern() {
        assert_eq!(FindSpec::by_name("db-.*").name_pattern(), Some("db-.*"));
        assert_eq!(FindSpec::by_name("").name_pattern(), None);
        assert_eq!(FindSpec::default().name_pattern(), None);
    }

    #[test]
    fn test_find_spec_deserialization() {
        let json = r#"{"name": {"regexp": "some-key.*"}}"#;
        let find: FindSpec = serde_json::from_str(json).unwrap();
        assert_eq!(find.name_pattern(), Some("some-key.*"));
        assert!(find.path.is_none());
        assert!(find.tags.is_empty());
    }

    #[test]
    fn test_push_secret_data_camel_case() {
        let data = PushSecretData {
            secret_key: Some("token".to_string()),
            remote_ref: PushRemoteRef {
                remote_key: "remote".to_string(),
                property: None,
            },
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"secretKey\""));
        assert!(json.contains("\"remoteKey\""));
    }
}
