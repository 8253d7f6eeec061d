use args::Args;
use clap::Parser;
use config::Config;
use server::ServeConfig;
use tokio_util::sync::CancellationToken;

mod args;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args);

    let config = match args.config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration in {}: {e:#}", args.config.display());
            std::process::exit(1);
        }
    };

    if rustls::crypto::aws_lc_rs::default_provider().install_default().is_err() {
        log::debug!("A TLS crypto provider was already installed");
    }

    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();

        async move {
            server::shutdown_signal().await;
            shutdown.cancel();
        }
    });

    if let Err(e) = server::serve(serve_config(&args, config, shutdown)).await {
        log::error!("{e:#}");
        std::process::exit(1);
    }

    log::info!("Shutdown complete");

    Ok(())
}

fn serve_config(args: &Args, config: Config, shutdown: CancellationToken) -> ServeConfig {
    let listen_address = args
        .listen_address
        .or(config.server.listen_address)
        .unwrap_or(server::DEFAULT_LISTEN_ADDRESS);

    ServeConfig {
        listen_address,
        config,
        shutdown,
    }
}
