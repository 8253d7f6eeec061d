//! The token review pipeline: parse, consult the cache, resolve upstream, authorize, respond.

use std::sync::Arc;

use access::{DEFAULT_REALM, Identity, RealmError, RealmPolicy, UNAUTHENTICATED_UID, UserInfoOptions, user_info};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use gitlab::{AccountService, GitlabError, GroupFilter, REQUEST_ID_HEADER};
use jiff::Timestamp;
use secrecy::SecretString;
use telemetry::metrics::{AUTHENTICATION_ATTEMPTS, AUTHENTICATION_FAILURES};
use token_cache::UserInfoCache;

use crate::review::{TokenReview, TokenReviewRequest, TypeMeta};

/// Why a review was rejected, as reported in the failure counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cause {
    Malformed,
    NotFound,
    Unauthorized,
}

impl Cause {
    fn as_str(self) -> &'static str {
        match self {
            Cause::Malformed => "malformed",
            Cause::NotFound => "not_found",
            Cause::Unauthorized => "unauthorized",
        }
    }
}

/// Final state of a review.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub status: StatusCode,
    pub review: TokenReview,
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (self.status, Json(self.review)).into_response()
    }
}

/// Everything a review needs, built once at startup.
pub(crate) struct Authenticator {
    accounts: Arc<dyn AccountService>,
    cache: UserInfoCache,
    policy: RealmPolicy,
    options: UserInfoOptions,
    filter: GroupFilter,
    token_prefixes: Vec<String>,
}

impl Authenticator {
    pub fn new(
        accounts: Arc<dyn AccountService>,
        cache: UserInfoCache,
        policy: RealmPolicy,
        options: UserInfoOptions,
        filter: GroupFilter,
        token_prefixes: Vec<String>,
    ) -> Self {
        Self {
            accounts,
            cache,
            policy,
            options,
            filter,
            token_prefixes,
        }
    }

    pub async fn review(&self, realm: &str, body: &[u8], request_id: Option<&str>) -> Outcome {
        metrics::counter!(AUTHENTICATION_ATTEMPTS, "realm" => realm.to_string()).increment(1);

        let request = match serde_json::from_slice::<TokenReviewRequest>(body) {
            Ok(request) => request,
            Err(e) => {
                log::info!("Invalid authentication request received: {e}");
                return reject(realm, TypeMeta::default(), Cause::Malformed, "malformed review request");
            }
        };

        let type_meta = request.type_meta();
        let token = request.spec.token;

        if token.is_empty() {
            log::info!("Invalid authentication request received: missing token");
            return reject(realm, type_meta, Cause::Malformed, "malformed review request");
        }

        if !self.preflight(&token) {
            log::info!("Invalid authentication request received: token validation failed");
            return reject(realm, type_meta, Cause::Malformed, "malformed review request");
        }

        let identity = match self.cache.get(&token) {
            Some(identity) if !identity.is_authenticated() => {
                log::info!("Cached authentication failure for user {}", identity.username);
                return reject(realm, type_meta, Cause::NotFound, "repeated authentication failure");
            }
            Some(identity) => {
                log::debug!("Using cached authentication for user {}", identity.username);
                identity
            }
            None => {
                let secret = SecretString::from(token.as_str());

                match self.resolve(&secret, request_id).await {
                    Ok(identity) => {
                        log::debug!("Authentication succeeded for user {}", identity.username);
                        self.cache.set(token, identity.clone());

                        identity
                    }
                    Err((username, e)) => {
                        log::info!("Authentication failed for user {username}: {e}");
                        self.cache.set(token, Identity::unauthenticated(username));

                        return reject(realm, type_meta, Cause::NotFound, "unable to review request");
                    }
                }
            }
        };

        if let Err(e) = self.policy.authorize(realm, &identity) {
            match e {
                RealmError::NoSuchRealm(_) => log::warn!("Authorization failed for user {}: {e}", identity.username),
                RealmError::Denied { .. } => log::info!("Authorization failed: {e}"),
            }

            let message = format!("precondition failed: {}", e.reason());
            return reject(realm, type_meta, Cause::Unauthorized, message);
        }

        log::info!("Authorization accepted for user {} in realm {realm:?}", identity.username);

        Outcome {
            status: StatusCode::OK,
            review: TokenReview::accepted(type_meta, identity),
        }
    }

    fn preflight(&self, token: &str) -> bool {
        self.token_prefixes.is_empty() || self.token_prefixes.iter().any(|p| token.starts_with(p.as_str()))
    }

    /// On failure, returns the username known at that point for logging.
    async fn resolve(&self, token: &SecretString, request_id: Option<&str>) -> Result<Identity, (String, GitlabError)> {
        let account = self
            .accounts
            .current_account(token, request_id)
            .await
            .map_err(|e| (UNAUTHENTICATED_UID.to_string(), e))?;

        let groups = self
            .accounts
            .list_groups(token, &self.filter, request_id)
            .await
            .map_err(|e| (account.username.clone(), e))?;

        Ok(user_info(&account, &groups, &self.options, Timestamp::now()))
    }
}

fn reject(realm: &str, type_meta: TypeMeta, cause: Cause, message: impl Into<String>) -> Outcome {
    metrics::counter!(
        AUTHENTICATION_FAILURES,
        "realm" => realm.to_string(),
        "cause" => cause.as_str()
    )
    .increment(1);

    let status = match cause {
        Cause::Malformed => StatusCode::BAD_REQUEST,
        Cause::NotFound | Cause::Unauthorized => StatusCode::UNAUTHORIZED,
    };

    Outcome {
        status,
        review: TokenReview::rejected(type_meta, message),
    }
}

/// Routes `<base>/authenticate` for the default realm and `<base>/authenticate/{realm}`.
pub(crate) fn router(authenticator: Arc<Authenticator>, base_path: &str) -> Router {
    let path = format!("{}/authenticate", base_path.trim_end_matches('/'));

    Router::new()
        .route(&path, post(authenticate_default))
        .route(&format!("{path}/{{realm}}"), post(authenticate_realm))
        .with_state(authenticator)
}

async fn authenticate_default(State(authenticator): State<Arc<Authenticator>>, headers: HeaderMap, body: Bytes) -> Outcome {
    authenticator.review(DEFAULT_REALM, &body, request_id(&headers)).await
}

async fn authenticate_realm(
    State(authenticator): State<Arc<Authenticator>>,
    Path(realm): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Outcome {
    authenticator.review(&realm, &body, request_id(&headers)).await
}

fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(REQUEST_ID_HEADER).and_then(|value| value.to_str().ok())
}
