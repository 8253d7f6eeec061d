use indoc::formatdoc;
use integration_tests::{GitlabMock, TestServer};

use crate::{jane, robot};

#[tokio::test]
async fn valid_token_is_accepted() {
    let gitlab = GitlabMock::new()
        .with_account("glpat-jane", jane())
        .with_groups("glpat-jane", &["platform", "platform/sre"])
        .spawn()
        .await
        .unwrap();

    let server = TestServer::start(&gitlab.config()).await;

    let response = server.client.authenticate("glpat-jane").await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();

    insta::with_settings!({ sort_maps => true }, {
        insta::assert_json_snapshot!(body, { ".metadata.creationTimestamp" => "[timestamp]" }, @r#"
        {
          "apiVersion": "authentication.k8s.io/v1",
          "kind": "TokenReview",
          "metadata": {
            "creationTimestamp": "[timestamp]"
          },
          "status": {
            "authenticated": true,
            "user": {
              "extra": {
                "gitlab-authn.kubernetes.io/user-attributes": [
                  "2fa"
                ]
              },
              "groups": [
                "platform",
                "platform:sre"
              ],
              "uid": "42",
              "username": "jane"
            }
          }
        }
        "#);
    });
}

#[tokio::test]
async fn accepted_identity_is_cached() {
    let gitlab = GitlabMock::new().with_account("glpat-jane", jane()).spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    for _ in 0..3 {
        let response = server.client.authenticate("glpat-jane").await;
        assert_eq!(response.status(), 200);
    }

    assert_eq!(gitlab.user_calls(), 1);
    assert_eq!(gitlab.group_calls(), 1);
}

#[tokio::test]
async fn unknown_token_is_negatively_cached() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    let response = server.client.authenticate("glpat-nobody").await;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    insta::assert_json_snapshot!(body["status"], @r#"
    {
      "error": "unable to review request"
    }
    "#);

    let response = server.client.authenticate("glpat-nobody").await;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    insta::assert_json_snapshot!(body["status"], @r#"
    {
      "error": "repeated authentication failure"
    }
    "#);

    assert_eq!(gitlab.user_calls(), 1);
    assert_eq!(gitlab.group_calls(), 0);
}

#[tokio::test]
async fn token_without_known_prefix_is_malformed() {
    let gitlab = GitlabMock::new().with_account("jane-token", jane()).spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    let response = server.client.authenticate("jane-token").await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"]["error"], "malformed review request");
    assert_eq!(gitlab.user_calls(), 0);
}

#[tokio::test]
async fn empty_prefix_list_accepts_any_token() {
    let gitlab = GitlabMock::new().with_account("jane-token", jane()).spawn().await.unwrap();

    let config = formatdoc! {r#"
        {}
        token_prefixes = []
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.authenticate("jane-token").await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn invalid_json_is_malformed() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    let response = server.client.post_raw("/authenticate", r#"{"spec": "#).await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();

    insta::assert_json_snapshot!(body, { ".metadata.creationTimestamp" => "[timestamp]" }, @r#"
    {
      "apiVersion": "authentication.k8s.io/v1",
      "kind": "TokenReview",
      "metadata": {
        "creationTimestamp": "[timestamp]"
      },
      "status": {
        "error": "malformed review request"
      }
    }
    "#);
}

#[tokio::test]
async fn bots_are_rejected_in_protected_realm() {
    let gitlab = GitlabMock::new()
        .with_account("glpat-robot", robot())
        .with_account("glpat-jane", jane())
        .spawn()
        .await
        .unwrap();

    let config = formatdoc! {r#"
        {}

        [[realms.""]]

        [[realms.production]]
        reject_bots = true
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.authenticate_in("production", "glpat-robot").await;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"]["error"], "precondition failed: Robot users are not allowed");

    let response = server.client.authenticate_in("production", "glpat-jane").await;
    assert_eq!(response.status(), 200);

    // The default realm has no restrictions.
    let response = server.client.authenticate("glpat-robot").await;
    assert_eq!(response.status(), 200);

    // A denial does not evict the cached identity.
    assert_eq!(gitlab.user_calls(), 2);
}

#[tokio::test]
async fn default_realm_rules_apply_to_every_realm() {
    let gitlab = GitlabMock::new()
        .with_account("glpat-robot", robot())
        .with_groups("glpat-robot", &["platform/sre"])
        .spawn()
        .await
        .unwrap();

    let config = formatdoc! {r#"
        {}

        [[realms.""]]
        reject_bots = true

        [[realms.production]]
        require_groups = ["platform:sre"]
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let response = server.client.authenticate_in("production", "glpat-robot").await;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"]["error"], "precondition failed: Robot users are not allowed");
}

#[tokio::test]
async fn unknown_realm_is_rejected() {
    let gitlab = GitlabMock::new().with_account("glpat-jane", jane()).spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    let response = server.client.authenticate_in("staging", "glpat-jane").await;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["status"]["error"],
        r#"precondition failed: No such authentication realm "staging""#
    );
}

#[tokio::test]
async fn request_id_is_forwarded_upstream() {
    let gitlab = GitlabMock::new().with_account("glpat-jane", jane()).spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;

    let response = server.client.authenticate("glpat-jane").await;
    assert_eq!(response.status(), 200);

    let echoed = response.headers()["x-request-id"].to_str().unwrap().to_string();
    let forwarded = gitlab.request_ids();

    assert_eq!(forwarded, vec![echoed.clone(), echoed]);
}

#[tokio::test]
async fn custom_base_path() {
    let gitlab = GitlabMock::new().with_account("glpat-jane", jane()).spawn().await.unwrap();

    let config = formatdoc! {r#"
        {}

        [server]
        path = "/webhook/"
    "#, gitlab.config()};

    let server = TestServer::start(&config).await;

    let request = integration_tests::review_request("glpat-jane");

    let response = server.client.post("/webhook/authenticate", &request).await;
    assert_eq!(response.status(), 200);

    let response = server.client.post("/authenticate", &request).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn graceful_shutdown() {
    let gitlab = GitlabMock::new().spawn().await.unwrap();
    let server = TestServer::start(&gitlab.config()).await;
    let address = server.address;

    server.stop().await.unwrap();

    let result = reqwest::get(format!("http://{address}/health")).await;
    assert!(result.is_err());
}
