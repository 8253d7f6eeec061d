//! HTTP server configuration settings.

use std::{borrow::Cow, net::SocketAddr};

use serde::Deserialize;

use crate::{HealthConfig, MetricsConfig, ProfileConfig, TlsServerConfig, WebConfig};

/// HTTP server configuration settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the webhook should listen on.
    pub listen_address: Option<SocketAddr>,
    /// Base path of the webhook routes. The authentication endpoints live under `<path>/authenticate`.
    pub path: Cow<'static, str>,
    /// TLS configuration for secure connections.
    pub tls: Option<TlsServerConfig>,
    /// Health endpoint configuration.
    pub health: HealthConfig,
    /// Prometheus exposition endpoint configuration.
    pub metrics: MetricsConfig,
    /// Runtime introspection endpoint configuration.
    pub profile: ProfileConfig,
    /// Static landing page configuration.
    pub web: WebConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            path: Cow::Borrowed("/"),
            tls: None,
            health: HealthConfig::default(),
            metrics: MetricsConfig::default(),
            profile: ProfileConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Route of the default realm, derived from the base path.
    pub fn authenticate_path(&self) -> String {
        format!("{}/authenticate", self.path.trim_end_matches('/'))
    }
}
