use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use versionmgr_server::{start_server, ServerConfig};

#[derive(Parser)]
#[command(name = "versionmgr-server")]
#[command(about = "Version catalog, compatibility checks and service registry", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "VERSIONMGR_HTTP_BIND")]
    bind: Option<String>,
    /// Version catalog file (JSON or YAML)
    #[arg(long, env = "VERSIONMGR_CATALOG_PATH")]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if let Err(err) = versionmgr_core::logging::init_tracing(None) {
        eprintln!("failed to initialise tracing: {err}");
    }

    let args = Args::parse();
    let mut config = ServerConfig::from_env().context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(catalog) = args.catalog {
        config.catalog_path = catalog;
    }

    let handle = start_server(config).await?;
    info!(addr = %handle.addr, "versionmgr-server ready");

    shutdown_signal().await;
    info!("shutting down");
    handle.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
