use std::path::PathBuf;

use serde::Deserialize;

/// Static landing page configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebConfig {
    /// Directory served for GET requests not matched by any other route.
    pub directory: Option<PathBuf>,
}
