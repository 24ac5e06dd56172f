//! Version manager: coordination service for a microservices application.
//!
//! The workspace is split into three crates:
//!
//! * `versionmgr-core`: errors, configuration, logging and JSON helpers
//! * `versionmgr-compat`: catalog evaluation and the in-memory service registry
//! * `versionmgr-server`: the REST API and the `versionmgr-server` binary

pub use versionmgr_compat as compat;
pub use versionmgr_core as common;
pub use versionmgr_server as server;

pub use versionmgr_compat::{
    validate_combination, CatalogHandle, CombinationQuery, ServiceDescriptor, ServiceRegistry,
    VersionCatalog,
};

/// Version of the REST contract served by `versionmgr-server`.
pub const API_VERSION: &str = "1.0.0";
