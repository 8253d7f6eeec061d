//! Upstream GitLab instance settings.

use std::time::Duration;

use duration_str::deserialize_duration;
use serde::Deserialize;
use url::Url;

use crate::GitlabTlsConfig;

const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(180 * 24 * 60 * 60);

/// Upstream GitLab instance settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitlabConfig {
    /// Base URL of the GitLab instance. The API lives under `<url>/api/v4`.
    pub url: Url,
    /// Timeout of a single API request.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    /// Project boolean account attributes into `gitlab:<attribute>` groups.
    pub attributes_as_groups: bool,
    /// Accounts without activity for longer than this are considered dormant. Zero disables the check.
    #[serde(deserialize_with = "deserialize_duration")]
    pub inactivity_timeout: Duration,
    /// Accepted token prefixes. Tokens without one of them are rejected before any upstream call.
    /// An empty list accepts every token.
    pub token_prefixes: Vec<String>,
    /// Filter applied when listing the group memberships of an account.
    pub group_filter: GroupFilterConfig,
    /// Client TLS settings.
    pub tls: Option<GitlabTlsConfig>,
}

impl Default for GitlabConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("https://gitlab.com/").expect("static URL must parse"),
            timeout: Duration::from_secs(10),
            attributes_as_groups: false,
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            token_prefixes: vec!["glpat-".to_string(), "gloas-".to_string(), "glsoat-".to_string()],
            group_filter: GroupFilterConfig::default(),
            tls: None,
        }
    }
}

/// Filter applied when listing group memberships.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupFilterConfig {
    /// Only list groups explicitly owned by the account.
    pub owned_only: bool,
    /// Only list top level groups.
    pub top_level_only: bool,
    /// Minimal access level the account must have in a group.
    pub min_access_level: AccessLevel,
    /// Only list groups matching this search term.
    pub name: Option<String>,
    /// Maximum number of groups to fetch.
    pub limit: u32,
}

impl Default for GroupFilterConfig {
    fn default() -> Self {
        Self {
            owned_only: false,
            top_level_only: false,
            min_access_level: AccessLevel::default(),
            name: None,
            limit: 20,
        }
    }
}

/// GitLab member access levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Lowest level, equivalent to no filter.
    #[default]
    Minimal,
    /// Guest access.
    Guest,
    /// Planner access.
    Planner,
    /// Reporter access.
    Reporter,
    /// Developer access.
    Developer,
    /// Maintainer access.
    Maintainer,
    /// Owner access.
    Owner,
}

impl AccessLevel {
    /// The numeric value used by the GitLab API.
    pub fn as_u8(self) -> u8 {
        match self {
            AccessLevel::Minimal => 5,
            AccessLevel::Guest => 10,
            AccessLevel::Planner => 15,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
        }
    }
}
