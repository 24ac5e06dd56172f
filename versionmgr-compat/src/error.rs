use std::path::PathBuf;

use thiserror::Error;

/// Broad classification used by callers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required catalog section is missing. This is a deployment problem,
    /// not a property of the request.
    ConfigurationUnavailable,
    InvalidInput,
    NotFound,
    Internal,
}

/// Errors returned by the catalog evaluator and the service registry.
#[derive(Debug, Error)]
pub enum CompatError {
    #[error("version catalog unavailable: application metadata is missing")]
    CatalogUnavailable,
    #[error("compatibility data unavailable in the version catalog")]
    CompatibilityUnavailable,
    #[error("invalid {field}: {value:?} is not a valid semantic version")]
    InvalidVersion { field: &'static str, value: String },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("service {0} not found")]
    ServiceNotFound(String),
    #[error("invalid compatibility matrix key {0:?}: expected \"serviceA:serviceB\"")]
    InvalidMatrixKey(String),
    #[error("catalog path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read catalog from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog from {path}: {message}")]
    Parse { path: String, message: String },
}

impl CompatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompatError::CatalogUnavailable | CompatError::CompatibilityUnavailable => {
                ErrorKind::ConfigurationUnavailable
            }
            CompatError::InvalidVersion { .. }
            | CompatError::MissingField(_)
            | CompatError::InvalidMatrixKey(_) => ErrorKind::InvalidInput,
            CompatError::ServiceNotFound(_) => ErrorKind::NotFound,
            CompatError::MissingPath(_) | CompatError::Io { .. } | CompatError::Parse { .. } => {
                ErrorKind::Internal
            }
        }
    }

    pub fn invalid_version(field: &'static str, value: impl Into<String>) -> Self {
        CompatError::InvalidVersion {
            field,
            value: value.into(),
        }
    }

    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompatError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CompatError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }
}
