use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::registry::ServiceRegistration;

/// Status of a pairwise matrix check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Unknown,
    Incompatible,
    Compatible,
    Tested,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PairCompatibility {
    pub compatible: bool,
    pub status: PairStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidVersions {
    pub service: String,
    pub valid_versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible_range: Option<String>,
    pub message: String,
}

/// A registered service as seen through an application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationService {
    #[serde(flatten)]
    pub registration: ServiceRegistration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_version_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_compatible: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationServices {
    pub application: String,
    pub version: String,
    pub services: Vec<ApplicationService>,
    pub all_compatible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationVersions {
    pub application: String,
    pub version: String,
    /// Whether an application configuration exists for this release.
    pub configured: bool,
    pub versions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Valid,
    Invalid,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub service_id: String,
    pub version: String,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_range: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CombinationValidation {
    pub application: String,
    pub version: String,
    pub all_valid: bool,
    pub results: Vec<ServiceCheck>,
}
