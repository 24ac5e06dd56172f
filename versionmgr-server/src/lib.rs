//! HTTP boundary of the version manager.
//!
//! Exposes the catalog evaluator and the service registry over REST. Routes
//! that change registry state require the shared registration token when one
//! is configured.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use versionmgr_compat::{CatalogHandle, ServiceRegistry};

pub use api::VersionApiBuilder;
pub use auth::RegistrationAuth;
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

/// Handle returned when the server is started programmatically.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}

/// Builds the router for `config` around an already loaded catalog.
pub fn build_router(
    config: &ServerConfig,
    registry: ServiceRegistry,
    catalog: CatalogHandle,
) -> axum::Router {
    let auth = RegistrationAuth::new(config.registration_token.clone());
    if !auth.is_enabled() {
        warn!("no registration token configured, mutating routes are open");
    }

    VersionApiBuilder::new(registry, catalog)
        .with_auth(auth)
        .into_router()
        .layer(config.cors_layer())
}

/// Loads the catalog, binds the listener and serves in a background task.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<ServerHandle> {
    let catalog = CatalogHandle::open(&config.catalog_path).with_context(|| {
        format!(
            "failed to load version catalog from {}",
            config.catalog_path.display()
        )
    })?;
    let registry = ServiceRegistry::with_options(config.registry);
    serve(&config, registry, catalog).await
}

/// Serves the API for an existing registry and catalog.
pub async fn serve(
    config: &ServerConfig,
    registry: ServiceRegistry,
    catalog: CatalogHandle,
) -> anyhow::Result<ServerHandle> {
    let router = build_router(config, registry, catalog);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;
    info!(node = %config.node_name, %actual_addr, "starting versionmgr-server");

    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
        {
            warn!(?err, "server terminated with error");
        }
    });

    Ok(ServerHandle {
        addr: actual_addr,
        shutdown: tx,
        task,
    })
}
