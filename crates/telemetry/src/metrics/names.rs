//! Metric names exported by gitlab-authn.

/// HTTP server request duration in seconds, labelled by method, route and status.
pub const HTTP_SERVER_REQUEST_DURATION: &str = "http_server_request_duration_seconds";

/// Upstream GitLab request duration in seconds, labelled by service (`users`, `groups`).
pub const GITLAB_REQUEST_DURATION: &str = "gitlab_authn_gitlab_request_duration_seconds";

/// Token reviews, labelled by realm.
pub const AUTHENTICATION_ATTEMPTS: &str = "gitlab_authn_authentication_attempts_total";

/// Failed token reviews, labelled by realm and cause.
pub const AUTHENTICATION_FAILURES: &str = "gitlab_authn_authentication_failures_total";

pub const CACHE_INSERTIONS: &str = "gitlab_authn_userinfo_cache_insertions_total";
pub const CACHE_HITS: &str = "gitlab_authn_userinfo_cache_hits_total";
pub const CACHE_MISSES: &str = "gitlab_authn_userinfo_cache_misses_total";
pub const CACHE_EVICTIONS: &str = "gitlab_authn_userinfo_cache_evictions_total";
