//! gitlab-authn server library.
//!
//! Provides a reusable server function to serve the webhook either for the binary, or for the integration tests.

#![deny(missing_docs)]

mod authenticate;
mod health;
mod http_metrics;
mod landing;
mod lifecycle;
mod profile;
mod request_id;
mod review;

use std::{net::SocketAddr, sync::Arc};

use access::{RealmPolicy, UserInfoOptions};
use anyhow::Context;
use axum::{Router, http::header, routing::get};
use config::Config;
use gitlab::{GitlabClient, GroupFilter};
use jiff::Timestamp;
use telemetry::PrometheusHandle;
use token_cache::UserInfoCache;
use tokio_util::sync::CancellationToken;

pub use lifecycle::shutdown_signal;

use authenticate::Authenticator;
use health::Health;
use http_metrics::MetricsLayer;
use landing::LandingPage;
use lifecycle::{Eviction, Listener};
use request_id::RequestIdLayer;

/// Address used when neither the command line nor the configuration sets one.
pub const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);

/// Configuration for serving gitlab-authn.
pub struct ServeConfig {
    /// The socket address (IP and port) the webhook will bind to
    pub listen_address: SocketAddr,
    /// The deserialized gitlab-authn TOML configuration.
    pub config: Config,
    /// Cancelling the token shuts the server down gracefully.
    pub shutdown: CancellationToken,
}

/// Starts and runs the webhook and its auxiliary listeners until shutdown.
pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        shutdown,
    }: ServeConfig,
) -> anyhow::Result<()> {
    let start_time = Timestamp::now();

    config.validate()?;

    let prometheus = telemetry::init()?;
    let cache = UserInfoCache::new(config.cache.ttl);
    let health = Health::default();

    let accounts = GitlabClient::new(&config.gitlab)?;
    let policy = RealmPolicy::from_config(&config.realms);

    let authenticator = Authenticator::new(
        Arc::new(accounts),
        cache.clone(),
        policy,
        UserInfoOptions::from(&config.gitlab),
        GroupFilter::from(&config.gitlab.group_filter),
        config.gitlab.token_prefixes.clone(),
    );

    let server = &config.server;
    let mut app = authenticate::router(Arc::new(authenticator), &server.path);
    let mut listeners = Vec::new();

    if server.health.enabled {
        let router = health::router(health.clone(), &server.health);

        match server.health.listen {
            Some(address) => listeners.push(auxiliary("health", address, router, &config)),
            None => app = app.merge(router),
        }
    }

    if server.metrics.enabled {
        let router = metrics_router(&server.metrics.path, prometheus);

        match server.metrics.listen {
            Some(address) => listeners.push(auxiliary("metrics", address, router, &config)),
            None => app = app.merge(router),
        }
    }

    if server.profile.enabled {
        let router = profile::router(&server.profile.path, cache.clone());

        match server.profile.listen {
            Some(address) => listeners.push(auxiliary("profile", address, router, &config)),
            None => app = app.merge(router),
        }
    }

    if let Some(ref directory) = server.web.directory {
        let landing = LandingPage {
            gitlab_url: &config.gitlab.url,
            start_time,
        };

        app = app.merge(landing.router(directory).await?);
    }

    let app = app.layer(MetricsLayer).layer(RequestIdLayer::new());

    log::info!("Token reviews accepted at {}", config.server.authenticate_path());

    listeners.insert(
        0,
        Listener {
            name: "webhook",
            address: listen_address,
            router: app,
            tls: server.tls.clone(),
            health: Some(health),
        },
    );

    let eviction = Eviction {
        cache,
        interval: config.cache.eviction_interval,
    };

    lifecycle::run(listeners, eviction, shutdown)
        .await
        .context("gitlab-authn server terminated")
}

fn auxiliary(name: &'static str, address: SocketAddr, router: Router, config: &Config) -> Listener {
    Listener {
        name,
        address,
        router: router.layer(MetricsLayer),
        tls: config.server.tls.clone(),
        health: None,
    }
}

fn metrics_router(path: &str, handle: PrometheusHandle) -> Router {
    let render = move || {
        let handle = handle.clone();

        async move { ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], handle.render()) }
    };

    Router::new().route(path, get(render))
}
