use std::convert::Infallible;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{ConfigError, VersionManagerError};

/// Prefix used for every environment variable read by the service.
pub const ENV_PREFIX: &str = "VERSIONMGR_";

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Unrecognised names fall back to development.
impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        })
    }
}

/// Configuration shared by the version manager binaries.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub environment: Environment,
    pub node_name: String,
    pub http_bind: String,
    pub catalog_path: PathBuf,
    /// Shared secret expected as a bearer token on mutating routes.
    pub registration_token: Option<String>,
    /// Keep the first `registeredAt` when a service registers again.
    pub preserve_registered_at: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            node_name: "versionmgr-node".to_string(),
            http_bind: "0.0.0.0:3000".to_string(),
            catalog_path: PathBuf::from("versions.json"),
            registration_token: None,
            preserve_registered_at: false,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl CoreConfig {
    /// Loads configuration from the process environment using [`ENV_PREFIX`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Loads configuration from env vars prefixed with the provided value.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);
        let defaults = Self::default();

        let environment = read_optional(&key("ENV"))?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        let node_name = read_optional(&key("NODE_NAME"))?.unwrap_or(defaults.node_name);
        let http_bind = read_optional(&key("HTTP_BIND"))?.unwrap_or(defaults.http_bind);
        let catalog_path = read_optional(&key("CATALOG_PATH"))?
            .map(PathBuf::from)
            .unwrap_or(defaults.catalog_path);
        let registration_token = read_optional(&key("REGISTRATION_TOKEN"))?;
        let preserve_registered_at =
            parse_env::<u8>(&key("PRESERVE_REGISTERED_AT"), 0)? != 0;

        let allowed_origins = read_optional(&key("ALLOWED_ORIGINS"))?
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);

        Ok(Self {
            environment,
            node_name,
            http_bind,
            catalog_path,
            registration_token,
            preserve_registered_at,
            allowed_origins,
        })
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    /// Rejects combinations that are only acceptable during development.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && self.registration_token.is_none() {
            return Err(ConfigError::MissingEnvVar(format!(
                "{ENV_PREFIX}REGISTRATION_TOKEN is required in production"
            )));
        }
        Ok(())
    }
}

/// Helper that loads config and converts to the canonical error type.
pub fn load_core_config() -> Result<CoreConfig, VersionManagerError> {
    let config = CoreConfig::from_env()?;
    config.validate()?;
    Ok(config)
}

fn read_optional(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidEnvVar {
            key: key.to_string(),
            source: err,
        }),
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match read_optional(key)? {
        Some(value) => T::from_str(&value).map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        }),
        None => Ok(default),
    }
}
