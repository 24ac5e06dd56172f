use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CompatError;

/// Release metadata for the application as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Entry of the informational service roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// A combination of service versions that has been run together.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestedCombination {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub frontend: Option<String>,
    #[serde(default)]
    pub scraper: Option<String>,
    /// Date the combination was verified, e.g. `09-Aug-2025`.
    #[serde(default)]
    pub verified: Option<String>,
}

impl TestedCombination {
    /// The verification date, ignoring blank values.
    pub fn verified_date(&self) -> Option<&str> {
        self.verified
            .as_deref()
            .map(str::trim)
            .filter(|date| !date.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilitySection {
    #[serde(default)]
    pub tested_combinations: Vec<TestedCombination>,
}

/// Parsed version catalog. Every section is optional; operations that need a
/// missing section fail explicitly instead of defaulting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionCatalog {
    #[serde(default)]
    pub application: Option<ApplicationInfo>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceInfo>,
    /// consumer -> dependency -> required range
    #[serde(default)]
    pub dependencies: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub compatibility: Option<CompatibilitySection>,
}

impl VersionCatalog {
    pub fn application(&self) -> Result<&ApplicationInfo, CompatError> {
        self.application
            .as_ref()
            .ok_or(CompatError::CatalogUnavailable)
    }

    pub fn compatibility(&self) -> Result<&CompatibilitySection, CompatError> {
        self.compatibility
            .as_ref()
            .ok_or(CompatError::CompatibilityUnavailable)
    }

    /// Range `consumer` declares for `dependency`, if any.
    pub fn dependency_range(&self, consumer: &str, dependency: &str) -> Option<&str> {
        self.dependencies
            .get(consumer)
            .and_then(|deps| deps.get(dependency))
            .map(String::as_str)
    }
}
