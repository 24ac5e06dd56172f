use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};
use versionmgr_core::serde_utils;

use crate::catalog::VersionCatalog;
use crate::error::CompatError;

/// Reads a version catalog from a JSON (or YAML) file.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<VersionCatalog, CompatError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CompatError::MissingPath(path.display().to_string()));
    }

    let raw = fs::read_to_string(path).map_err(|err| CompatError::from_io(path, err))?;
    parse_catalog(&raw, path)
}

fn parse_catalog(raw: &str, path: &Path) -> Result<VersionCatalog, CompatError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml"));

    let parsed = if is_yaml {
        serde_utils::from_yaml_str(raw)
    } else {
        serde_utils::from_json_str(raw)
    };

    parsed.map_err(|err| CompatError::parse_error(path, err.to_string()))
}

/// Shared, reloadable snapshot of the catalog.
///
/// Readers get an `Arc` to an immutable catalog, so a reload never changes a
/// snapshot that is already being evaluated.
#[derive(Clone)]
pub struct CatalogHandle {
    path: Option<PathBuf>,
    current: Arc<RwLock<Arc<VersionCatalog>>>,
}

impl CatalogHandle {
    /// Loads the catalog at `path`; failure here is meant to stop the process.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CompatError> {
        let path = path.into();
        let catalog = load_catalog(&path)?;
        info!(path = %path.display(), "version catalog loaded");
        Ok(Self {
            path: Some(path),
            current: Arc::new(RwLock::new(Arc::new(catalog))),
        })
    }

    /// Wraps an in-memory catalog. `reload` keeps it as is.
    pub fn from_catalog(catalog: VersionCatalog) -> Self {
        Self {
            path: None,
            current: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    pub fn snapshot(&self) -> Arc<VersionCatalog> {
        self.current.read().clone()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-reads the catalog file. On failure the previous snapshot stays.
    pub fn reload(&self) -> Result<Arc<VersionCatalog>, CompatError> {
        let Some(path) = &self.path else {
            return Ok(self.snapshot());
        };

        match load_catalog(path) {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                *self.current.write() = catalog.clone();
                info!(path = %path.display(), "version catalog reloaded");
                Ok(catalog)
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "catalog reload failed, keeping previous snapshot");
                Err(err)
            }
        }
    }
}
