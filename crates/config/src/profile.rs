//! Runtime introspection endpoint configuration.

use std::{borrow::Cow, net::SocketAddr};

use serde::Deserialize;

/// Runtime introspection endpoints, serving tokio runtime and cache statistics.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Whether the introspection endpoints are enabled.
    pub enabled: bool,
    /// The socket address the endpoints should listen on. Shares the webhook listener when absent.
    pub listen: Option<SocketAddr>,
    /// Base path of the endpoints.
    pub path: Cow<'static, str>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            enabled: false,
            listen: None,
            path: Cow::Borrowed("/debug"),
        }
    }
}
