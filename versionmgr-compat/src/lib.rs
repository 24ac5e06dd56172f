//! Compatibility rules and service bookkeeping for the version manager.
//!
//! Two independent validation strategies live here. The catalog evaluator
//! checks a backend/frontend/scraper combination against the static list of
//! tested combinations and declared dependency ranges. The service registry
//! tracks live instances and answers pairwise and application-level questions
//! from a dynamic compatibility matrix.

mod application;
mod catalog;
mod error;
mod evaluator;
mod loader;
mod matrix;
mod outcome;
mod registry;
pub mod version;

pub use application::{ApplicationConfig, ApplicationConfigInput, RequiredService};
pub use catalog::{
    ApplicationInfo, CompatibilitySection, ServiceInfo, TestedCombination, VersionCatalog,
};
pub use error::{CompatError, ErrorKind};
pub use evaluator::{
    validate_combination, CombinationQuery, CombinationReport, CombinationStatus,
    COMBINATION_SERVICES,
};
pub use loader::{load_catalog, CatalogHandle};
pub use matrix::{
    CompatibilityEntry, CompatibilityMatrix, MatrixDocument, MatrixEntry, MatrixLookup, PairKey,
};
pub use outcome::{
    ApplicationService, ApplicationServices, ApplicationVersions, CheckStatus,
    CombinationValidation, PairCompatibility, PairStatus, ServiceCheck, ValidVersions,
};
pub use registry::{RegistryOptions, ServiceDescriptor, ServiceRegistration, ServiceRegistry};
