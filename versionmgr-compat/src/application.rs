use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A service an application release needs, with the versions it accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequiredService {
    pub service_id: String,
    #[serde(default = "RequiredService::any_version")]
    pub version_range: String,
}

impl RequiredService {
    pub fn new(service_id: impl Into<String>, version_range: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            version_range: version_range.into(),
        }
    }

    fn any_version() -> String {
        "*".to_string()
    }
}

/// Body of a set-config call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfigInput {
    #[serde(default)]
    pub required_services: Vec<RequiredService>,
}

/// Stored configuration for one `appId` + version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfig {
    pub required_services: Vec<RequiredService>,
    pub last_updated: DateTime<Utc>,
}

impl ApplicationConfig {
    pub fn requirement(&self, service_id: &str) -> Option<&RequiredService> {
        self.required_services
            .iter()
            .find(|required| required.service_id == service_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct AppKey {
    app_id: String,
    version: String,
}

impl AppKey {
    pub(crate) fn new(app_id: &str, version: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            version: version.to_string(),
        }
    }
}
