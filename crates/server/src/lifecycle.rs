//! Runs the listeners and the cache eviction as independent units sharing one cancellation token.

use std::{net::SocketAddr, time::Duration};

use anyhow::anyhow;
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use config::TlsServerConfig;
use tokio::{net::TcpListener, task::JoinSet};
use tokio_util::sync::CancellationToken;
use token_cache::{EvictionTask, UserInfoCache};

use crate::health::Health;

/// Time in-flight requests get to complete once shutdown starts.
const GRACE_PERIOD: Duration = Duration::from_secs(3);

/// An HTTP listener unit.
pub(crate) struct Listener {
    pub name: &'static str,
    pub address: SocketAddr,
    pub router: Router,
    pub tls: Option<TlsServerConfig>,
    /// Readiness driven by this listener. Only the webhook listener carries one.
    pub health: Option<Health>,
}

impl Listener {
    async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let Listener {
            name,
            address,
            router,
            tls,
            health,
        } = self;

        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| anyhow!("Failed to bind {name} listener to {address}: {e}"))?;

        let rustls_config = match tls {
            Some(ref tls) => Some(
                RustlsConfig::from_pem_file(&tls.certificate, &tls.key)
                    .await
                    .map_err(|e| anyhow!("Failed to load TLS certificate and key: {e}"))?,
            ),
            None => None,
        };

        let scheme = if rustls_config.is_some() { "https" } else { "http" };
        log::info!("Serving {name} endpoint at {scheme}://{address}");

        let handle = Handle::new();
        let watcher = tokio::spawn({
            let handle = handle.clone();
            let health = health.clone();

            async move {
                shutdown.cancelled().await;

                if let Some(health) = health {
                    health.degrade();
                }

                log::debug!("Draining {name} listener");
                handle.graceful_shutdown(Some(GRACE_PERIOD));
            }
        });

        if let Some(ref health) = health {
            health.restore();
        }

        let service = router.into_make_service();
        let listener = listener.into_std()?;

        let result = match rustls_config {
            Some(config) => {
                axum_server::from_tcp_rustls(listener, config)
                    .handle(handle)
                    .serve(service)
                    .await
            }
            None => axum_server::from_tcp(listener).handle(handle).serve(service).await,
        };

        watcher.abort();

        if let Some(health) = health {
            health.degrade();
        }

        result.map_err(|e| anyhow!("Failed to serve {name} endpoint: {e}"))?;
        log::debug!("The {name} listener stopped");

        Ok(())
    }
}

/// Periodic removal of expired cache entries.
pub(crate) struct Eviction {
    pub cache: UserInfoCache,
    pub interval: Duration,
}

/// Runs the listeners until the token is cancelled or one of them fails.
///
/// A failing listener cancels the token so the others shut down. The first failure is returned.
/// The cache eviction runs until every listener has drained.
pub(crate) async fn run(
    listeners: Vec<Listener>,
    eviction: Eviction,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let sweep = EvictionTask::start(eviction.cache, eviction.interval);
    let mut units = JoinSet::new();

    for listener in listeners {
        units.spawn(listener.serve(shutdown.clone()));
    }

    let mut result = Ok(());

    while let Some(joined) = units.join_next().await {
        let outcome = joined.map_err(|e| anyhow!("Server unit failed: {e}")).and_then(|r| r);

        if let Err(e) = outcome {
            shutdown.cancel();

            if result.is_ok() {
                log::error!("{e}");
                result = Err(e);
            }
        }
    }

    sweep.stop().await;

    result
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install the SIGINT handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install the SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received SIGINT, shutting down"),
        _ = terminate => log::info!("Received SIGTERM, shutting down"),
    }
}
