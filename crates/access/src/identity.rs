use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// UID marking an identity as the result of a failed authentication.
pub const UNAUTHENTICATED_UID: &str = "n/a";

/// Prefix of every extra key set by gitlab-authn.
pub const EXTRA_NAMESPACE: &str = "gitlab-authn.kubernetes.io/";

/// Extra key listing the derived account attributes.
pub const ATTRIBUTES_KEY: &str = "gitlab-authn.kubernetes.io/user-attributes";

/// Prefix of groups projected from account attributes.
pub const GROUP_PREFIX: &str = "gitlab:";

/// The user information reported back to Kubernetes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Vec<String>>,
}

impl Identity {
    /// Placeholder for a token which could not be resolved. The username is kept for logging.
    pub fn unauthenticated(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            uid: UNAUTHENTICATED_UID.to_string(),
            groups: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.uid != UNAUTHENTICATED_UID
    }

    /// Names of the derived account attributes.
    pub fn attributes(&self) -> &[String] {
        self.extra.get(ATTRIBUTES_KEY).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes().iter().any(|a| a == attribute)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}
