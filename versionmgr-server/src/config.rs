use std::path::PathBuf;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;
use versionmgr_compat::RegistryOptions;
use versionmgr_core::config::{load_core_config, CoreConfig};
use versionmgr_core::VersionManagerError;

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub node_name: String,
    pub bind_address: String,
    pub catalog_path: PathBuf,
    pub registration_token: Option<String>,
    pub allowed_origins: Vec<String>,
    pub registry: RegistryOptions,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, VersionManagerError> {
        Ok(Self::from_core(&load_core_config()?))
    }

    pub fn from_core(core: &CoreConfig) -> Self {
        Self {
            node_name: core.node_name.clone(),
            bind_address: core.http_bind.clone(),
            catalog_path: core.catalog_path.clone(),
            registration_token: core.registration_token.clone(),
            allowed_origins: core.allowed_origins.clone(),
            registry: RegistryOptions {
                preserve_registered_at: core.preserve_registered_at,
            },
        }
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    /// Explicit CORS origins, or `None` when any origin is allowed. Values
    /// that are not valid header values are skipped.
    pub fn cors_origins(&self) -> Option<Vec<HeaderValue>> {
        if self.allowed_origins.iter().any(|origin| origin == "*") {
            return None;
        }
        let origins = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(%origin, ?err, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        Some(origins)
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let allow_origin = match self.cors_origins() {
            Some(origins) => AllowOrigin::list(origins),
            None => AllowOrigin::any(),
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(AllowMethods::list([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ]))
            .allow_headers(AllowHeaders::list([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
            ]))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_core(&CoreConfig::default())
    }
}
