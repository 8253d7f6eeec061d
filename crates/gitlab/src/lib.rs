//! Client for the subset of the GitLab REST API needed to resolve a personal access token
//! into an account and its group memberships.

mod client;
mod error;
mod filter;
mod model;

pub use client::GitlabClient;
pub use error::GitlabError;
pub use filter::GroupFilter;
pub use model::{Account, CustomAttribute, Group};

use async_trait::async_trait;
use secrecy::SecretString;

/// Header carrying the access token on every upstream request.
pub const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Header correlating upstream requests with the incoming review.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Resolves tokens into GitLab accounts.
///
/// Both calls authenticate with the token under review, so GitLab itself decides whether the
/// token is valid.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Fetches the account owning the token.
    async fn current_account(&self, token: &SecretString, request_id: Option<&str>) -> Result<Account, GitlabError>;

    /// Lists the groups the token owner is a member of.
    async fn list_groups(
        &self,
        token: &SecretString,
        filter: &GroupFilter,
        request_id: Option<&str>,
    ) -> Result<Vec<Group>, GitlabError>;
}
