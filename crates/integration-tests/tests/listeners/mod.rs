use indoc::formatdoc;
use integration_tests::{GitlabMock, TestClient, TestServer, free_address};

#[tokio::test]
async fn auxiliary_endpoints_on_separate_listeners() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();
    let health_address = free_address().await;
    let metrics_address = free_address().await;

    let config = formatdoc! {r#"
        {}

        [server.health]
        listen = "{health_address}"

        [server.metrics]
        listen = "{metrics_address}"
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.get("/health").await;
    assert_eq!(response.status(), 404);

    let response = server.client.get("/metrics").await;
    assert_eq!(response.status(), 404);

    let health = TestClient::for_address(health_address);
    let response = health.get("/health").await;
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @"OK");

    let metrics = TestClient::for_address(metrics_address);
    let response = metrics.get("/metrics").await;
    assert_eq!(response.status(), 200);

    let response = metrics.get("/health").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn webhook_answers_on_listen_address() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    let client = TestClient::for_address(server.address);
    let response = client.authenticate("glpat-unknown").await;

    assert_eq!(response.status(), 401);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn bind_failure_stops_the_server() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = occupied.local_addr().unwrap();

    let config = formatdoc! {r#"
        {}

        [server.metrics]
        listen = "{address}"
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;
    let result = server.stop().await;

    let error = result.unwrap_err();
    assert!(format!("{error:#}").contains("Failed to bind metrics listener"), "{error:#}");
}

#[tokio::test]
async fn conflicting_routes_fail_before_serving() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();

    let config = formatdoc! {r#"
        {}

        [server.health]
        path = "/metrics"
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;
    let result = server.stop().await;

    let error = result.unwrap_err();
    assert!(format!("{error:#}").contains("is already served by [server.health]"), "{error:#}");
}
