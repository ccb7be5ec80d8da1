use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use podmirror::{
    DEFAULT_API_BASE, Database, Poller, PsapiClient, ReqwestClient, Service, SyncEngine,
    SyncOptions, TracingReporter, create_router,
};

/// Mirror podcast catalogs into RSS feeds
#[derive(Parser, Debug)]
#[command(name = "podmirror")]
#[command(about = "Mirror podcast catalogs into per-show RSS feeds")]
#[command(version)]
struct Args {
    /// Address the HTTP server listens on
    #[arg(short, long, default_value = "0.0.0.0:8084")]
    listen: SocketAddr,

    /// SQLite database file, created if missing
    #[arg(short, long, default_value = "podmirror.db")]
    database: PathBuf,

    /// Base URL of the programme API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Keep sweeping the remaining shows when one show fails to sync
    #[arg(long)]
    isolate_failures: bool,

    /// Log filter, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("Invalid log filter '{default_filter}'"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM signal"),
                _ = ctrl_c() => info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Could not register SIGTERM handler, waiting for Ctrl+C only"
            );
            ctrl_c().await;
            info!("Received SIGINT signal (Ctrl+C)");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    ctrl_c().await;
    info!("Received Ctrl+C signal");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let db = Arc::new(
        Database::open(&args.database)
            .await
            .with_context(|| format!("Failed to open database {}", args.database.display()))?,
    );

    // One client for the whole process, shared by sync engine and front door
    let psapi = Arc::new(
        PsapiClient::new(ReqwestClient::new(), &args.api_base)
            .context("Failed to set up catalog client")?,
    );

    let engine = Arc::new(SyncEngine::new(
        db.clone(),
        psapi.clone(),
        psapi.clone(),
        TracingReporter::shared(),
    ));
    let options = SyncOptions {
        continue_on_error: args.isolate_failures,
    };
    let poller = Poller::new(engine, options).spawn();

    let service = Arc::new(Service::new(db.clone(), psapi));
    let app = create_router(service);

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!(address = %args.listen, "Serving feeds");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    // The store outlives the sweep task
    poller.shutdown().await;
    db.close().await;

    served
}
