//! Kubernetes `authentication.k8s.io` TokenReview wire format.

use access::Identity;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_API_VERSION: &str = "authentication.k8s.io/v1";
pub(crate) const DEFAULT_KIND: &str = "TokenReview";

/// Incoming review. Unknown fields such as `metadata` are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TokenReviewRequest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub spec: TokenReviewSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TokenReviewSpec {
    pub token: String,
}

/// `apiVersion` and `kind` echoed back in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TypeMeta {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
}

impl Default for TypeMeta {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            kind: DEFAULT_KIND.to_string(),
        }
    }
}

impl TokenReviewRequest {
    pub fn type_meta(&self) -> TypeMeta {
        let mut meta = TypeMeta::default();

        if !self.api_version.is_empty() {
            meta.api_version.clone_from(&self.api_version);
        }

        if !self.kind.is_empty() {
            meta.kind.clone_from(&self.kind);
        }

        meta
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenReview {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub status: TokenReviewStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct ObjectMeta {
    #[serde(rename = "creationTimestamp")]
    pub creation_timestamp: Timestamp,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct TokenReviewStatus {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TokenReview {
    pub fn accepted(type_meta: TypeMeta, identity: Identity) -> Self {
        Self::new(
            type_meta,
            TokenReviewStatus {
                authenticated: true,
                user: Some(identity),
                error: None,
            },
        )
    }

    pub fn rejected(type_meta: TypeMeta, error: impl Into<String>) -> Self {
        Self::new(
            type_meta,
            TokenReviewStatus {
                authenticated: false,
                user: None,
                error: Some(error.into()),
            },
        )
    }

    fn new(type_meta: TypeMeta, status: TokenReviewStatus) -> Self {
        Self {
            type_meta,
            metadata: ObjectMeta {
                creation_timestamp: Timestamp::now(),
            },
            status,
        }
    }
}
