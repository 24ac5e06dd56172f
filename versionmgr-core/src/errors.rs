use std::io;

use thiserror::Error;

/// Result type used across the version manager core crate.
pub type Result<T> = std::result::Result<T, VersionManagerError>;

/// Canonical error representation shared by the version manager crates.
#[derive(Debug, Error)]
pub enum VersionManagerError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for VersionManagerError {
    fn from(err: serde_json::Error) -> Self {
        VersionManagerError::DeserializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for VersionManagerError {
    fn from(err: serde_yaml::Error) -> Self {
        VersionManagerError::DeserializationError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {source}")]
    InvalidEnvVar {
        key: String,
        #[source]
        source: std::env::VarError,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for VersionManagerError {
    fn from(value: ConfigError) -> Self {
        VersionManagerError::ConfigError(value.to_string())
    }
}
