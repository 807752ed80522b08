//! Aegis Server Binary
//!
//! API server for the Aegis batch metrics engine.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use aegis_server::{create_router, AppState, ServerConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;

#[derive(Parser)]
#[command(name = "aegis-server")]
#[command(about = "Aegis Metrics API Server")]
struct Args {
    /// Host to bind to (overrides the config file)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => match ServerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };
    let config = config.with_address(args.host, args.port);
    let addr: SocketAddr = config.socket_addr();

    tracing::info!("Starting Aegis Server on {}", addr);
    tracing::info!(
        "Metrics scope: {}, resolutions: {:?}",
        config.metrics.scope,
        config.metrics.ordered_resolutions()
    );

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize metrics engine: {}", e);
            std::process::exit(1);
        }
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Aegis Server listening on http://{}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server");
}
