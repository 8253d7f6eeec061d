//! gitlab-authn configuration structures to map the gitlab-authn.toml configuration.

#![deny(missing_docs)]

mod cache;
mod gitlab;
mod health;
mod loader;
mod metrics;
mod profile;
mod realms;
mod server;
mod tls;
mod web;

use std::{collections::BTreeMap, path::Path};

pub use cache::CacheConfig;
pub use gitlab::{AccessLevel, GitlabConfig, GroupFilterConfig};
pub use health::{HealthConfig, HealthContentType};
pub use metrics::MetricsConfig;
pub use profile::ProfileConfig;
pub use realms::RealmAccessRules;
pub use server::ServerConfig;
pub use tls::{GitlabTlsConfig, TlsServerConfig};
pub use web::WebConfig;

use serde::Deserialize;

/// Main configuration structure for the gitlab-authn application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream GitLab instance settings.
    #[serde(default)]
    pub gitlab: GitlabConfig,
    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Access rules per authentication realm. The empty name is the default realm.
    #[serde(default)]
    pub realms: BTreeMap<String, Vec<RealmAccessRules>>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validates value ranges which cannot be expressed through the type system.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}
