//! TLS settings for the webhook listener and the upstream GitLab client.

use std::path::PathBuf;

use serde::Deserialize;

/// Certificate pair presented by the webhook listener.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsServerConfig {
    /// Path to the TLS certificate PEM file.
    pub certificate: PathBuf,
    /// Path to the TLS private key PEM file.
    pub key: PathBuf,
}

/// Trust and client identity used when talking to GitLab.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitlabTlsConfig {
    /// Accept any server certificate. Only meant for test installations.
    pub skip_verify: bool,
    /// Additional PEM bundle of trusted certificate authorities.
    pub ca_certificate: Option<PathBuf>,
    /// Client certificate PEM file for mutual TLS.
    pub certificate: Option<PathBuf>,
    /// Client private key PEM file for mutual TLS.
    pub key: Option<PathBuf>,
}
