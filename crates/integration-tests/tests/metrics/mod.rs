use indoc::formatdoc;
use integration_tests::{GitlabMock, TestServer};

use crate::jane;

#[tokio::test]
async fn prometheus_exposition() {
    let gitlab = GitlabMock::new().with_account("glpat-jane", jane()).spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    let response = server.client.authenticate("glpat-jane").await;
    assert_eq!(response.status(), 200);

    let response = server.client.authenticate("glpat-unknown").await;
    assert_eq!(response.status(), 401);

    let response = server.client.get("/metrics").await;
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let body = response.text().await.unwrap();

    for name in [
        "gitlab_authn_authentication_attempts_total",
        "gitlab_authn_authentication_failures_total",
        "gitlab_authn_userinfo_cache_insertions_total",
        "gitlab_authn_userinfo_cache_misses_total",
        "gitlab_authn_gitlab_request_duration_seconds",
        "http_server_request_duration_seconds",
    ] {
        assert!(body.contains(name), "{name} missing from:\n{body}");
    }

    assert!(body.contains(r#"cause="not_found""#), "{body}");
}

#[tokio::test]
async fn metrics_endpoint_disabled() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();

    let config = formatdoc! {r#"
        {}

        [server.metrics]
        enabled = false
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.get("/metrics").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn profile_endpoints() {
    let gitlab = GitlabMock::new().with_account("glpat-jane", jane()).spawn().await.unwrap();

    let config = formatdoc! {r#"
        {}

        [server.profile]
        enabled = true
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.authenticate("glpat-jane").await;
    assert_eq!(response.status(), 200);

    let response = server.client.get("/debug/cache").await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();

    insta::with_settings!({ sort_maps => true }, {
        insta::assert_json_snapshot!(body, @r#"
        {
          "entries": 1,
          "evictions": 0,
          "hits": 0,
          "insertions": 1,
          "misses": 1
        }
        "#);
    });

    let response = server.client.get("/debug/runtime").await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["workers"].as_u64().unwrap() > 0);
}
