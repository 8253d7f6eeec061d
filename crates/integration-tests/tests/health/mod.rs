use indoc::formatdoc;
use integration_tests::{GitlabMock, TestServer};

#[tokio::test]
async fn health_endpoint_enabled() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    let response = server.client.get("/health").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @"OK");
}

#[tokio::test]
async fn health_endpoint_disabled() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();

    let config = formatdoc! {r#"
        {}

        [server.health]
        enabled = false
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.get("/health").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn health_endpoint_custom_path_and_json() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();

    let config = formatdoc! {r#"
        {}

        [server.health]
        path = "/healthz"
        content_type = "json"
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.get("/healthz").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"{"status": "OK"}"#);

    let response = server.client.get("/health").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn health_endpoint_html() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();

    let config = formatdoc! {r#"
        {}

        [server.health]
        content_type = "html"
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.get("/health").await;
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"<h1 style="color: green">OK</h1>"#);
}
