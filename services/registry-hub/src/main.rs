//! Registry hub server

use std::net::SocketAddr;

use camino::Utf8PathBuf;
use clap::Parser;
use eyre::WrapErr as _;
use registry_client::RegistryClient;
use registry_hub::HubBuilder;
use registry_hub::config::Config;
use registry_store::RegistryStore;
use tracing_subscriber::EnvFilter;

/// Serve the registry hub API
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "registry-hub.toml")]
    config: Utf8PathBuf,

    /// Address to listen on, overriding the config file
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Path of the registry file, overriding the config file
    #[arg(long)]
    data: Option<Utf8PathBuf>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .await
        .wrap_err_with(|| format!("loading {}", args.config))?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(data) = args.data {
        config.data = data;
    }

    let store = RegistryStore::open(&config.data)
        .await
        .wrap_err("opening registry file")?;
    let client = RegistryClient::new().timeout(config.probe_timeout());

    let app = HubBuilder::new(store).client(client).build();

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .wrap_err_with(|| format!("binding {}", config.listen))?;

    tracing::info!("Registry hub listening on http://{}", config.listen);
    tracing::info!(data = %config.data, "serving registries");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await?;

    Ok(())
}

async fn shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
