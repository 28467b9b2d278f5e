//! Captain gateway binary.
//!
//! ```text
//! parse CLI → load config → logging/metrics
//!     → ServiceManager (shared, Arc)
//!     → signal forwarder + deferred initialize()
//!     → HttpServer (plain or TLS) until shutdown
//!     → ServiceManager::shutdown()
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use captain_gateway::config::{load_config, GatewayConfig};
use captain_gateway::lifecycle::{signals, startup, Shutdown};
use captain_gateway::net::load_tls_config;
use captain_gateway::observability::{logging, metrics};
use captain_gateway::{HttpServer, ServiceManager, Services};

#[derive(Parser)]
#[command(name = "captain-gateway")]
#[command(about = "Front-door HTTP dispatcher for the captain", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "captain-gateway starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let manager = Arc::new(ServiceManager::new(config.tls.force_https));
    tracing::info!(health_id = %manager.health_check_id(), "Service manager created");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_signals(shutdown.clone()));
    let init = startup::schedule_initialize(
        manager.clone(),
        startup::InitializeSchedule::from(&config.startup),
        shutdown.subscribe(),
    );

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, Services::new(manager.clone()), shutdown.clone())?;

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(&tls).await?;
            let addr: SocketAddr = bind_address.parse()?;
            server.run_tls(addr, rustls).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener).await?;
        }
    }

    shutdown.trigger();
    init.abort();
    manager.shutdown();

    tracing::info!("Shutdown complete");
    Ok(())
}
