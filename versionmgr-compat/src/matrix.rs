//! Pairwise compatibility matrix.
//!
//! Entries are stored under a canonical unordered [`PairKey`], so a lookup for
//! `(a, b)` and `(b, a)` lands on the same slot. Each entry remembers which
//! service its `versionRangeA` belongs to. A slot holds at most one entry per
//! declared orientation; a lookup prefers the one declared in query order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CompatError;
use crate::outcome::{PairCompatibility, PairStatus};
use crate::version;

/// Unordered pair of service identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: String,
    high: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    /// Splits a `"serviceA:serviceB"` document key.
    pub fn parse_document_key(key: &str) -> Result<(String, String), CompatError> {
        match key.split_once(':') {
            Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok((a.to_string(), b.to_string())),
            _ => Err(CompatError::InvalidMatrixKey(key.to_string())),
        }
    }
}

/// Version constraints declared for one service pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_range_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_range_b: Option<String>,
    #[serde(default)]
    pub tested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_date: Option<String>,
}

impl CompatibilityEntry {
    pub fn range_a(&self) -> &str {
        self.version_range_a.as_deref().unwrap_or("*")
    }

    pub fn range_b(&self) -> &str {
        self.version_range_b.as_deref().unwrap_or("*")
    }
}

/// Entry form used by list-shaped matrix documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatrixEntry {
    pub service_a: String,
    pub service_b: String,
    #[serde(flatten)]
    pub entry: CompatibilityEntry,
}

/// Accepted shapes for a bulk matrix replacement.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MatrixDocument {
    /// `{"backend:frontend": {...}}`
    Keyed(BTreeMap<String, CompatibilityEntry>),
    /// `[{"serviceA": "backend", "serviceB": "frontend", ...}]`
    Entries(Vec<MatrixEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredEntry {
    service_a: String,
    service_b: String,
    entry: CompatibilityEntry,
}

/// Result of a lookup, oriented to the order of the query.
#[derive(Debug, Clone, Copy)]
pub struct MatrixLookup<'a> {
    pub entry: &'a CompatibilityEntry,
    /// The entry was declared as `second:first`.
    pub reversed: bool,
}

impl<'a> MatrixLookup<'a> {
    /// Range that applies to the first service of the lookup.
    pub fn range_for_first(&self) -> &'a str {
        if self.reversed {
            self.entry.range_b()
        } else {
            self.entry.range_a()
        }
    }

    /// Range that applies to the second service of the lookup.
    pub fn range_for_second(&self) -> &'a str {
        if self.reversed {
            self.entry.range_a()
        } else {
            self.entry.range_b()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityMatrix {
    entries: HashMap<PairKey, Vec<StoredEntry>>,
}

impl CompatibilityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: MatrixDocument) -> Result<Self, CompatError> {
        let mut matrix = Self::new();
        match document {
            MatrixDocument::Keyed(entries) => {
                for (key, entry) in entries {
                    let (a, b) = PairKey::parse_document_key(&key)?;
                    matrix.insert(a, b, entry);
                }
            }
            MatrixDocument::Entries(entries) => {
                for item in entries {
                    if item.service_a.is_empty() {
                        return Err(CompatError::MissingField("serviceA"));
                    }
                    if item.service_b.is_empty() {
                        return Err(CompatError::MissingField("serviceB"));
                    }
                    matrix.insert(item.service_a, item.service_b, item.entry);
                }
            }
        }
        Ok(matrix)
    }

    /// Inserts or replaces the entry declared as `service_a:service_b`. An
    /// entry declared the other way round is kept alongside it.
    pub fn insert(
        &mut self,
        service_a: impl Into<String>,
        service_b: impl Into<String>,
        entry: CompatibilityEntry,
    ) {
        let service_a = service_a.into();
        let service_b = service_b.into();
        let slot = self
            .entries
            .entry(PairKey::new(&service_a, &service_b))
            .or_default();

        let stored = StoredEntry {
            service_a,
            service_b,
            entry,
        };
        match slot
            .iter_mut()
            .find(|existing| existing.service_a == stored.service_a)
        {
            Some(existing) => {
                warn!(
                    service_a = %stored.service_a,
                    service_b = %stored.service_b,
                    "compatibility entry declared twice, keeping the last one"
                );
                *existing = stored;
            }
            None => slot.push(stored),
        }
    }

    /// Finds the entry for `(a, b)`, preferring one declared as `a:b` over one
    /// declared as `b:a`.
    pub fn lookup(&self, a: &str, b: &str) -> Option<MatrixLookup<'_>> {
        let slot = self.entries.get(&PairKey::new(a, b))?;
        let stored = slot
            .iter()
            .find(|stored| stored.service_a == a)
            .or_else(|| slot.first())?;
        Some(MatrixLookup {
            entry: &stored.entry,
            reversed: stored.service_a != a,
        })
    }

    /// Number of declared entries, counting each orientation separately.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keyed view of the matrix in declared orientation.
    pub fn to_document(&self) -> BTreeMap<String, CompatibilityEntry> {
        self.entries
            .values()
            .flatten()
            .map(|stored| {
                (
                    format!("{}:{}", stored.service_a, stored.service_b),
                    stored.entry.clone(),
                )
            })
            .collect()
    }

    /// Checks two service versions against the declared ranges.
    ///
    /// The `requirements` map labels `service_a` with the entry's
    /// `versionRangeA` and `service_b` with `versionRangeB`, positionally,
    /// even when the entry was declared in the opposite order.
    pub fn evaluate(
        &self,
        service_a: &str,
        version_a: &str,
        service_b: &str,
        version_b: &str,
    ) -> PairCompatibility {
        let Some(found) = self.lookup(service_a, service_b) else {
            return PairCompatibility {
                compatible: false,
                status: PairStatus::Unknown,
                message: format!(
                    "No compatibility information for {service_a} and {service_b}"
                ),
                requirements: None,
                tested_date: None,
            };
        };

        let a_ok = version::satisfies(version_a, found.range_for_first());
        let b_ok = version::satisfies(version_b, found.range_for_second());

        if !(a_ok && b_ok) {
            let mut requirements = BTreeMap::new();
            requirements.insert(service_a.to_string(), found.entry.range_a().to_string());
            requirements.insert(service_b.to_string(), found.entry.range_b().to_string());
            return PairCompatibility {
                compatible: false,
                status: PairStatus::Incompatible,
                message: format!(
                    "{service_a}@{version_a} is not compatible with {service_b}@{version_b}"
                ),
                requirements: Some(requirements),
                tested_date: None,
            };
        }

        if found.entry.tested {
            PairCompatibility {
                compatible: true,
                status: PairStatus::Tested,
                message: format!(
                    "{service_a}@{version_a} and {service_b}@{version_b} are tested and verified"
                ),
                requirements: None,
                tested_date: found.entry.tested_date.clone(),
            }
        } else {
            PairCompatibility {
                compatible: true,
                status: PairStatus::Compatible,
                message: format!(
                    "{service_a}@{version_a} and {service_b}@{version_b} are compatible by declared ranges"
                ),
                requirements: None,
                tested_date: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(range_a: &str, range_b: &str, tested: bool) -> CompatibilityEntry {
        CompatibilityEntry {
            version_range_a: Some(range_a.to_string()),
            version_range_b: Some(range_b.to_string()),
            tested,
            tested_date: tested.then(|| "2025-08-09".to_string()),
        }
    }

    #[test]
    fn pair_key_is_order_independent() {
        assert_eq!(PairKey::new("backend", "frontend"), PairKey::new("frontend", "backend"));
    }

    #[test]
    fn rejects_keys_without_separator() {
        let err = PairKey::parse_document_key("backend").unwrap_err();
        assert!(matches!(err, CompatError::InvalidMatrixKey(_)));
        assert!(PairKey::parse_document_key(":frontend").is_err());
    }

    #[test]
    fn missing_entry_is_unknown() {
        let matrix = CompatibilityMatrix::new();
        let result = matrix.evaluate("backend", "1.0.0", "frontend", "1.0.0");
        assert_eq!(result.status, PairStatus::Unknown);
        assert!(!result.compatible);
    }

    #[test]
    fn out_of_range_is_incompatible_with_requirements() {
        let mut matrix = CompatibilityMatrix::new();
        matrix.insert("backend", "frontend", entry(">=1.0.0", ">=1.0.0", true));

        let result = matrix.evaluate("backend", "0.9.0", "frontend", "1.0.0");
        assert_eq!(result.status, PairStatus::Incompatible);
        assert!(!result.compatible);
        let requirements = result.requirements.expect("requirements");
        assert_eq!(requirements["backend"], ">=1.0.0");
        assert_eq!(requirements["frontend"], ">=1.0.0");
    }

    #[test]
    fn evaluation_is_symmetric() {
        let mut matrix = CompatibilityMatrix::new();
        matrix.insert("backend", "scraper", entry("^2.0.0", "^1.0.0", false));

        for (va, vb) in [("2.1.0", "1.4.0"), ("1.0.0", "1.4.0"), ("2.0.0", "2.0.0")] {
            let forward = matrix.evaluate("backend", va, "scraper", vb);
            let backward = matrix.evaluate("scraper", vb, "backend", va);
            assert_eq!(forward.compatible, backward.compatible, "{va}/{vb}");
            assert_eq!(forward.status, backward.status, "{va}/{vb}");
        }
    }

    #[test]
    fn reversed_lookup_labels_requirements_positionally() {
        let mut matrix = CompatibilityMatrix::new();
        matrix.insert("backend", "scraper", entry("^2.0.0", "^1.0.0", false));

        let result = matrix.evaluate("scraper", "3.0.0", "backend", "2.0.0");
        assert_eq!(result.status, PairStatus::Incompatible);
        let requirements = result.requirements.expect("requirements");
        assert_eq!(requirements["scraper"], "^2.0.0");
        assert_eq!(requirements["backend"], "^1.0.0");
    }

    #[test]
    fn both_orientations_are_kept_and_query_order_wins() {
        let document: MatrixDocument = serde_json::from_value(json!({
            "backend:frontend": { "versionRangeA": ">=2.0.0" },
            "frontend:backend": { "versionRangeA": "*", "versionRangeB": "*" }
        }))
        .expect("doc");
        let matrix = CompatibilityMatrix::from_document(document).expect("matrix");
        assert_eq!(matrix.len(), 2);

        let forward = matrix.evaluate("backend", "1.0.0", "frontend", "1.0.0");
        assert_eq!(forward.status, PairStatus::Incompatible);
        let backward = matrix.evaluate("frontend", "1.0.0", "backend", "1.0.0");
        assert_eq!(backward.status, PairStatus::Compatible);

        let document = matrix.to_document();
        assert!(document.contains_key("backend:frontend"));
        assert!(document.contains_key("frontend:backend"));
    }

    #[test]
    fn same_orientation_declared_twice_keeps_the_last() {
        let mut matrix = CompatibilityMatrix::new();
        matrix.insert("backend", "frontend", entry(">=2.0.0", "*", false));
        matrix.insert("backend", "frontend", entry("*", "*", true));
        assert_eq!(matrix.len(), 1);
        let result = matrix.evaluate("backend", "1.0.0", "frontend", "1.0.0");
        assert_eq!(result.status, PairStatus::Tested);
    }

    #[test]
    fn tested_entry_reports_date() {
        let mut matrix = CompatibilityMatrix::new();
        matrix.insert("backend", "frontend", entry("*", "*", true));
        let result = matrix.evaluate("frontend", "5.0.0", "backend", "1.0.0");
        assert_eq!(result.status, PairStatus::Tested);
        assert_eq!(result.tested_date.as_deref(), Some("2025-08-09"));
    }

    #[test]
    fn absent_ranges_default_to_any() {
        let mut matrix = CompatibilityMatrix::new();
        matrix.insert("a", "b", CompatibilityEntry::default());
        let result = matrix.evaluate("a", "0.0.1", "b", "9.9.9");
        assert_eq!(result.status, PairStatus::Compatible);
        assert!(result.compatible);
    }

    #[test]
    fn accepts_both_document_shapes() {
        let keyed: MatrixDocument = serde_json::from_value(json!({
            "backend:frontend": { "versionRangeA": ">=1.0.0", "tested": true }
        }))
        .expect("keyed");
        let listed: MatrixDocument = serde_json::from_value(json!([
            { "serviceA": "backend", "serviceB": "frontend", "versionRangeA": ">=1.0.0", "tested": true }
        ]))
        .expect("listed");

        let keyed = CompatibilityMatrix::from_document(keyed).expect("matrix");
        let listed = CompatibilityMatrix::from_document(listed).expect("matrix");
        assert_eq!(keyed, listed);
        assert_eq!(keyed.len(), 1);
        assert!(keyed.to_document().contains_key("backend:frontend"));
    }
}
