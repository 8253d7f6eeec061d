use reqwest::StatusCode;
use thiserror::Error;

/// Errors talking to the GitLab API.
#[derive(Debug, Error)]
pub enum GitlabError {
    /// The token cannot be sent as a header value.
    #[error("token contains characters not allowed in a header")]
    InvalidToken,

    /// GitLab did not accept the token.
    #[error("token rejected by GitLab")]
    Unauthorized,

    /// GitLab answered with an unexpected status.
    #[error("GitLab API error ({status}): {message}")]
    Status { status: StatusCode, message: String },

    /// The request did not complete.
    #[error("GitLab request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected schema.
    #[error("unable to decode GitLab response: {0}")]
    Decode(#[from] serde_json::Error),
}
