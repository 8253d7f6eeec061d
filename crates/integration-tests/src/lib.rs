pub mod gitlab;

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

use config::Config;
use server::ServeConfig;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

pub use gitlab::GitlabMock;

static INIT: Once = Once::new();

fn init_crypto_provider() {
    INIT.call_once(|| {
        rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .expect("Failed to install default crypto provider");
    });
}

/// Reserves a free local port and releases it for the server to bind.
pub async fn free_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A minimal TokenReview request for the given token.
pub fn review_request(token: &str) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "authentication.k8s.io/v1",
        "kind": "TokenReview",
        "spec": {
            "token": token,
        },
    })
}

/// Test client for making HTTP requests to the test server
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    /// Create a new test client for the given base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Create a test client pointing at another listener of the same server
    pub fn for_address(address: SocketAddr) -> Self {
        Self::new(format!("http://{address}"))
    }

    /// Send a POST request to the given path with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// Send a POST request with a raw body
    pub async fn post_raw(&self, path: &str, body: &'static str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    /// Review the token in the default realm
    pub async fn authenticate(&self, token: &str) -> reqwest::Response {
        self.post("/authenticate", &review_request(token)).await
    }

    /// Review the token in the given realm
    pub async fn authenticate_in(&self, realm: &str, token: &str) -> reqwest::Response {
        self.post(&format!("/authenticate/{realm}"), &review_request(token)).await
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }
}

/// Test server that manages the lifecycle of a server instance
pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    shutdown: CancellationToken,
    handle: Option<tokio::task::JoinHandle<anyhow::Result<()>>>,
}

impl TestServer {
    /// Start a new test server with the given TOML configuration
    pub async fn start(config_toml: &str) -> Self {
        init_crypto_provider();

        let config: Config = toml::from_str(config_toml).unwrap();
        let address = free_address().await;
        let shutdown = CancellationToken::new();

        let serve_config = ServeConfig {
            listen_address: address,
            config,
            shutdown: shutdown.clone(),
        };

        let handle = tokio::spawn(server::serve(serve_config));

        let client = TestClient::new(format!("http://{address}"));

        // Any answer means the webhook listener accepts connections. A server which failed
        // to start reports its error through `stop`.
        let mut retries = 20;
        while retries > 0 {
            if let Ok(Ok(_)) = timeout(Duration::from_millis(100), reqwest::get(format!("http://{address}/"))).await {
                break;
            }

            if handle.is_finished() {
                break;
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestServer {
            client,
            address,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Cancels the server and waits for all its listeners to stop.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        self.shutdown.cancel();

        match self.handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
