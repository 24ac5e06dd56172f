//! Catalog based validation of a backend/frontend/scraper combination.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{TestedCombination, VersionCatalog};
use crate::error::CompatError;
use crate::version;

/// Services a combination query can name, in evaluation order.
pub const COMBINATION_SERVICES: [&str; 3] = ["backend", "frontend", "scraper"];

/// Versions supplied by the caller. Any of them may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CombinationQuery {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub frontend: Option<String>,
    #[serde(default)]
    pub scraper: Option<String>,
}

impl CombinationQuery {
    pub fn new(
        backend: impl Into<String>,
        frontend: impl Into<String>,
        scraper: impl Into<String>,
    ) -> Self {
        Self {
            backend: Some(backend.into()),
            frontend: Some(frontend.into()),
            scraper: Some(scraper.into()),
        }
    }

    /// Supplied version for `service`; blank values count as not supplied.
    pub fn version_of(&self, service: &str) -> Option<&str> {
        let raw = match service {
            "backend" => self.backend.as_deref(),
            "frontend" => self.frontend.as_deref(),
            "scraper" => self.scraper.as_deref(),
            _ => None,
        };
        raw.filter(|value| !value.is_empty())
    }

    fn matches_exactly(&self, combination: &TestedCombination) -> bool {
        combination.backend == self.backend
            && combination.frontend == self.frontend
            && combination.scraper == self.scraper
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CombinationStatus {
    Tested,
    Compatible,
    Warning,
}

/// Outcome of [`validate_combination`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CombinationReport {
    pub valid: bool,
    pub status: CombinationStatus,
    pub warnings: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<String>,
}

/// Decides whether the queried versions are known to work together.
///
/// Declared dependency ranges produce warnings first; an exact match against a
/// tested combination then overrides them.
pub fn validate_combination(
    catalog: &VersionCatalog,
    query: &CombinationQuery,
) -> Result<CombinationReport, CompatError> {
    let compatibility = catalog.compatibility()?;

    let mut report = CombinationReport {
        valid: true,
        status: CombinationStatus::Compatible,
        warnings: dependency_warnings(catalog, query),
        message: "appears compatible but untested".to_string(),
        verified: None,
    };

    if !report.warnings.is_empty() {
        report.status = CombinationStatus::Warning;
        report.valid = false;
        report.message = "may have compatibility issues".to_string();
    }

    if let Some(combination) = compatibility
        .tested_combinations
        .iter()
        .find(|combination| query.matches_exactly(combination))
    {
        match combination.verified_date() {
            Some(date) => {
                report.status = CombinationStatus::Tested;
                report.message = "tested and verified".to_string();
                report.valid = true;
                report.verified = Some(date.to_string());
            }
            None => {
                report.status = CombinationStatus::Compatible;
                report.message = "untested".to_string();
            }
        }
    }

    debug!(
        status = ?report.status,
        valid = report.valid,
        warnings = report.warnings.len(),
        "validated service combination"
    );
    Ok(report)
}

fn dependency_warnings(catalog: &VersionCatalog, query: &CombinationQuery) -> Vec<String> {
    let mut warnings = Vec::new();

    for consumer in COMBINATION_SERVICES {
        let Some(requirements) = catalog.dependencies.get(consumer) else {
            continue;
        };

        for (dependency, range) in requirements {
            if !COMBINATION_SERVICES.contains(&dependency.as_str()) {
                continue;
            }

            let supplied = query.version_of(dependency);
            let satisfied = supplied.is_some_and(|value| version::satisfies(value, range));
            if !satisfied {
                warnings.push(format!(
                    "{} expects {} {}, got {}",
                    capitalize(consumer),
                    dependency,
                    range,
                    supplied.unwrap_or("no version")
                ));
            }
        }
    }

    warnings
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
