//! Prometheus exposition endpoint configuration.

use std::{borrow::Cow, net::SocketAddr};

use serde::Deserialize;

/// Prometheus exposition endpoint configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether the metrics endpoint is enabled.
    pub enabled: bool,
    /// The socket address the metrics endpoint should listen on. Shares the webhook listener when absent.
    pub listen: Option<SocketAddr>,
    /// The path for the metrics endpoint.
    pub path: Cow<'static, str>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            enabled: true,
            listen: None,
            path: Cow::Borrowed("/metrics"),
        }
    }
}
