//! A stand-in for the GitLab REST API, answering `/api/v4/user` and `/api/v4/groups`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builder for the GitLab test server
#[derive(Default)]
pub struct GitlabMock {
    accounts: HashMap<String, Value>,
    groups: HashMap<String, Vec<Value>>,
}

impl GitlabMock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as a credential of `account`.
    pub fn with_account(mut self, token: impl Into<String>, account: Value) -> Self {
        self.accounts.insert(token.into(), account);
        self
    }

    /// Report the given group paths as memberships of the account owning `token`.
    pub fn with_groups(mut self, token: impl Into<String>, full_paths: &[&str]) -> Self {
        let groups = full_paths
            .iter()
            .enumerate()
            .map(|(i, full_path)| {
                let path = full_path.rsplit('/').next().unwrap_or(full_path);

                json!({
                    "id": 100 + i,
                    "name": path,
                    "path": path,
                    "full_path": full_path,
                })
            })
            .collect();

        self.groups.insert(token.into(), groups);
        self
    }

    pub async fn spawn(self) -> anyhow::Result<TestGitlab> {
        let state = Arc::new(GitlabState {
            accounts: self.accounts,
            groups: self.groups,
            user_calls: AtomicUsize::new(0),
            group_calls: AtomicUsize::new(0),
            request_ids: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/v4/user", get(current_user))
            .route("/api/v4/groups", get(list_groups))
            .layer(middleware::from_fn(response_headers))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(TestGitlab { address, state })
    }
}

/// A running GitLab test server
pub struct TestGitlab {
    pub address: SocketAddr,
    state: Arc<GitlabState>,
}

impl TestGitlab {
    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Number of `/api/v4/user` requests received
    pub fn user_calls(&self) -> usize {
        self.state.user_calls.load(Ordering::SeqCst)
    }

    /// Number of `/api/v4/groups` requests received
    pub fn group_calls(&self) -> usize {
        self.state.group_calls.load(Ordering::SeqCst)
    }

    /// Request ids forwarded by the webhook, in arrival order
    pub fn request_ids(&self) -> Vec<String> {
        self.state.request_ids.lock().unwrap().clone()
    }

    /// The `[gitlab]` section pointing at this server.
    pub fn config(&self) -> String {
        indoc::formatdoc! {r#"
            [gitlab]
            url = "{}"
            timeout = "2s"
        "#, self.url()}
    }
}

struct GitlabState {
    accounts: HashMap<String, Value>,
    groups: HashMap<String, Vec<Value>>,
    user_calls: AtomicUsize,
    group_calls: AtomicUsize,
    request_ids: Mutex<Vec<String>>,
}

impl GitlabState {
    fn token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        if let Some(id) = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
            self.request_ids.lock().unwrap().push(id.to_string());
        }

        headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok())
    }
}

async fn current_user(State(state): State<Arc<GitlabState>>, headers: HeaderMap) -> Response {
    state.user_calls.fetch_add(1, Ordering::SeqCst);

    match state.token(&headers).and_then(|token| state.accounts.get(token)) {
        Some(account) => Json(account.clone()).into_response(),
        None => unauthorized(),
    }
}

async fn list_groups(State(state): State<Arc<GitlabState>>, headers: HeaderMap) -> Response {
    state.group_calls.fetch_add(1, Ordering::SeqCst);

    let Some(token) = state.token(&headers) else {
        return unauthorized();
    };

    if !state.accounts.contains_key(token) {
        return unauthorized();
    }

    let groups = state.groups.get(token).cloned().unwrap_or_default();

    Json(groups).into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "401 Unauthorized" }))).into_response()
}

/// Adds the bookkeeping headers a real GitLab instance sends with every answer.
async fn response_headers(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_str(&uuid::Uuid::new_v4().simple().to_string()).unwrap());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(REQUEST_ID_HEADER, request_id);
    headers.insert("x-runtime", HeaderValue::from_static("0.012345"));
    headers.insert("ratelimit-limit", HeaderValue::from_static("2000"));
    headers.insert("ratelimit-remaining", HeaderValue::from_static("1999"));

    response
}
