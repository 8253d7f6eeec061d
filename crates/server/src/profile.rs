//! Runtime introspection endpoints.

use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use token_cache::{CacheMetrics, UserInfoCache};

#[derive(Clone)]
struct ProfileState {
    cache: UserInfoCache,
    started: Instant,
}

#[derive(Debug, Serialize)]
struct RuntimeReport {
    uptime_seconds: u64,
    workers: usize,
    alive_tasks: usize,
    global_queue_depth: usize,
}

/// Serves `<path>/runtime` and `<path>/cache`.
pub(crate) fn router(path: &str, cache: UserInfoCache) -> Router {
    let path = path.trim_end_matches('/');

    let state = ProfileState {
        cache,
        started: Instant::now(),
    };

    Router::new()
        .route(&format!("{path}/runtime"), get(runtime))
        .route(&format!("{path}/cache"), get(cache_report))
        .with_state(state)
}

async fn runtime(State(state): State<ProfileState>) -> Json<RuntimeReport> {
    let metrics = tokio::runtime::Handle::current().metrics();

    Json(RuntimeReport {
        uptime_seconds: state.started.elapsed().as_secs(),
        workers: metrics.num_workers(),
        alive_tasks: metrics.num_alive_tasks(),
        global_queue_depth: metrics.global_queue_depth(),
    })
}

async fn cache_report(State(state): State<ProfileState>) -> Json<CacheMetrics> {
    Json(state.cache.metrics())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use access::Identity;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use insta::assert_json_snapshot;
    use serde_json::Value;
    use token_cache::UserInfoCache;
    use tower::ServiceExt;

    async fn get(router: axum::Router, path: &str) -> Value {
        let response = router.oneshot(Request::get(path).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn cache_report() {
        let cache = UserInfoCache::new(Duration::from_secs(60));
        cache.set("glpat-a", Identity::unauthenticated("n/a"));
        cache.get("glpat-a");
        cache.get("glpat-b");

        let report = get(super::router("/debug/", cache), "/debug/cache").await;

        assert_json_snapshot!(report, @r#"
        {
          "entries": 1,
          "evictions": 0,
          "hits": 1,
          "insertions": 1,
          "misses": 1
        }
        "#);
    }

    #[tokio::test]
    async fn runtime_report() {
        let cache = UserInfoCache::new(Duration::from_secs(60));
        let report = get(super::router("/debug", cache), "/debug/runtime").await;

        assert_eq!(report["workers"], 1);
        assert!(report["alive_tasks"].is_u64());
        assert!(report["uptime_seconds"].is_u64());
    }
}
