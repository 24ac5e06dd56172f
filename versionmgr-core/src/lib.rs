//! Core shared library for the version manager.
//!
//! This crate exposes the ambient primitives the other crates depend on:
//! common errors, configuration loading, JSON/YAML helpers and logging setup.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{CoreConfig, Environment};
pub use errors::{ConfigError, VersionManagerError};
