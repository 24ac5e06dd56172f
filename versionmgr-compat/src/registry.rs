use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::application::{AppKey, ApplicationConfig, ApplicationConfigInput};
use crate::error::CompatError;
use crate::matrix::{CompatibilityEntry, CompatibilityMatrix, MatrixDocument};
use crate::outcome::{
    ApplicationService, ApplicationServices, ApplicationVersions, CheckStatus,
    CombinationValidation, PairCompatibility, ServiceCheck, ValidVersions,
};
use crate::version;

/// A live service instance known to the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRegistration {
    pub id: String,
    pub name: String,
    pub version: String,
    pub endpoints: Value,
    pub dependencies: Value,
    pub registered_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// What a service announces when it registers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub endpoints: Option<Value>,
    #[serde(default)]
    pub dependencies: Option<Value>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoints(mut self, endpoints: Value) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Value) -> Self {
        self.dependencies = Some(dependencies);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Keep the original `registeredAt` when an id registers again. Off by
    /// default: a re-registration is treated as a fresh registration.
    pub preserve_registered_at: bool,
}

#[derive(Default)]
struct RegistryState {
    services: HashMap<String, ServiceRegistration>,
    // insertion order of `services`; re-registering keeps the slot
    order: Vec<String>,
    matrix: CompatibilityMatrix,
    applications: HashMap<AppKey, ApplicationConfig>,
    last_stamp: Option<DateTime<Utc>>,
}

impl RegistryState {
    /// Strictly increasing timestamp, so consecutive updates are ordered.
    fn stamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_stamp = Some(now);
        now
    }

    fn ordered_services(&self) -> Vec<ServiceRegistration> {
        self.order
            .iter()
            .filter_map(|id| self.services.get(id).cloned())
            .collect()
    }
}

/// In-memory registry of service instances, the pairwise compatibility matrix
/// and application configurations.
///
/// Every public operation takes the lock once, so each is atomic with
/// respect to the others. Clones share the same state.
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    inner: Arc<RwLock<RegistryState>>,
    options: RegistryOptions,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            inner: Arc::default(),
            options,
        }
    }

    /// Registers (or re-registers) a service instance under `service_id`.
    pub fn register(
        &self,
        service_id: &str,
        descriptor: ServiceDescriptor,
    ) -> Result<ServiceRegistration, CompatError> {
        if service_id.trim().is_empty() {
            return Err(CompatError::MissingField("serviceId"));
        }
        if descriptor.name.trim().is_empty() {
            return Err(CompatError::MissingField("name"));
        }
        if descriptor.version.trim().is_empty() {
            return Err(CompatError::MissingField("version"));
        }
        if !version::is_valid(&descriptor.version) {
            return Err(CompatError::invalid_version("version", descriptor.version));
        }

        let mut inner = self.inner.write();
        let now = inner.stamp();
        let previous = inner.services.get(service_id).map(|existing| existing.registered_at);
        let registered_at = match previous {
            Some(original) if self.options.preserve_registered_at => original,
            _ => now,
        };

        let registration = ServiceRegistration {
            id: service_id.to_string(),
            name: descriptor.name,
            version: descriptor.version,
            endpoints: descriptor.endpoints.unwrap_or_else(empty_object),
            dependencies: descriptor.dependencies.unwrap_or_else(empty_object),
            registered_at,
            last_updated: now,
        };

        if previous.is_none() {
            inner.order.push(service_id.to_string());
        }
        inner
            .services
            .insert(service_id.to_string(), registration.clone());

        info!(
            service_id,
            version = %registration.version,
            reregistered = previous.is_some(),
            "service registered"
        );
        Ok(registration)
    }

    /// Changes the advertised version of a registered service.
    pub fn update_version(
        &self,
        service_id: &str,
        new_version: &str,
    ) -> Result<ServiceRegistration, CompatError> {
        let mut inner = self.inner.write();
        if !inner.services.contains_key(service_id) {
            return Err(CompatError::ServiceNotFound(service_id.to_string()));
        }
        if !version::is_valid(new_version) {
            return Err(CompatError::invalid_version("version", new_version));
        }

        let now = inner.stamp();
        let registration = inner
            .services
            .get_mut(service_id)
            .ok_or_else(|| CompatError::ServiceNotFound(service_id.to_string()))?;
        let previous = std::mem::replace(&mut registration.version, new_version.to_string());
        registration.last_updated = now;

        info!(service_id, from = %previous, to = new_version, "service version updated");
        Ok(registration.clone())
    }

    pub fn get(&self, service_id: &str) -> Option<ServiceRegistration> {
        self.inner.read().services.get(service_id).cloned()
    }

    /// All registrations, in the order they were first registered.
    pub fn list_all(&self) -> Vec<ServiceRegistration> {
        self.inner.read().ordered_services()
    }

    pub fn unregister(&self, service_id: &str) -> bool {
        let mut inner = self.inner.write();
        let removed = inner.services.remove(service_id).is_some();
        if removed {
            inner.order.retain(|id| id != service_id);
            info!(service_id, "service unregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the whole compatibility matrix. Nothing changes if the
    /// document is rejected.
    pub fn set_compatibility_matrix(&self, document: MatrixDocument) -> Result<usize, CompatError> {
        let matrix = CompatibilityMatrix::from_document(document)?;
        Ok(self.replace_matrix(matrix))
    }

    pub fn replace_matrix(&self, matrix: CompatibilityMatrix) -> usize {
        let entries = matrix.len();
        self.inner.write().matrix = matrix;
        info!(entries, "compatibility matrix replaced");
        entries
    }

    /// Current matrix keyed `"serviceA:serviceB"`.
    pub fn matrix_entries(&self) -> BTreeMap<String, CompatibilityEntry> {
        self.inner.read().matrix.to_document()
    }

    pub fn validate_compatibility(
        &self,
        service_a: &str,
        version_a: &str,
        service_b: &str,
        version_b: &str,
    ) -> PairCompatibility {
        let result = self
            .inner
            .read()
            .matrix
            .evaluate(service_a, version_a, service_b, version_b);
        debug!(service_a, version_a, service_b, version_b, status = ?result.status, "pair validated");
        result
    }

    /// Which versions of `target` may run next to `dependent@dependent_version`.
    ///
    /// Only the currently registered version of the target is considered.
    pub fn get_valid_versions_for_service(
        &self,
        target: &str,
        dependent: &str,
        dependent_version: &str,
    ) -> Result<ValidVersions, CompatError> {
        let inner = self.inner.read();
        let current = inner
            .services
            .get(target)
            .map(|registration| registration.version.clone())
            .ok_or_else(|| CompatError::ServiceNotFound(target.to_string()))?;

        let Some(found) = inner.matrix.lookup(target, dependent) else {
            return Ok(ValidVersions {
                service: target.to_string(),
                valid_versions: vec![current],
                compatible_range: None,
                message: format!("No compatibility constraints between {target} and {dependent}"),
            });
        };

        let target_range = found.range_for_first();
        let dependent_range = found.range_for_second();

        if !version::satisfies(dependent_version, dependent_range) {
            return Ok(ValidVersions {
                service: target.to_string(),
                valid_versions: Vec::new(),
                compatible_range: Some(target_range.to_string()),
                message: format!(
                    "{dependent}@{dependent_version} does not satisfy required range {dependent_range}"
                ),
            });
        }

        if !version::satisfies(&current, target_range) {
            return Ok(ValidVersions {
                service: target.to_string(),
                valid_versions: Vec::new(),
                compatible_range: Some(target_range.to_string()),
                message: format!(
                    "Current {target}@{current} does not satisfy required range {target_range}"
                ),
            });
        }

        Ok(ValidVersions {
            service: target.to_string(),
            message: format!("{target}@{current} is compatible with {dependent}@{dependent_version}"),
            valid_versions: vec![current],
            compatible_range: Some(target_range.to_string()),
        })
    }

    /// Stores the required services of an application release, replacing any
    /// previous configuration for the same `app_id` and version.
    pub fn set_application_config(
        &self,
        app_id: &str,
        app_version: &str,
        input: ApplicationConfigInput,
    ) -> Result<ApplicationConfig, CompatError> {
        if app_id.trim().is_empty() {
            return Err(CompatError::MissingField("appId"));
        }
        if app_version.trim().is_empty() {
            return Err(CompatError::MissingField("applicationVersion"));
        }
        if input
            .required_services
            .iter()
            .any(|required| required.service_id.trim().is_empty())
        {
            return Err(CompatError::MissingField("requiredServices[].serviceId"));
        }

        let mut inner = self.inner.write();
        let config = ApplicationConfig {
            required_services: input.required_services,
            last_updated: inner.stamp(),
        };
        inner
            .applications
            .insert(AppKey::new(app_id, app_version), config.clone());

        info!(
            app_id,
            app_version,
            required = config.required_services.len(),
            "application configuration stored"
        );
        Ok(config)
    }

    /// Services of an application release.
    ///
    /// Without a configuration every registered service is returned. With one,
    /// only required services that are registered appear; unregistered ones
    /// are dropped, so `all_compatible` only covers what is present.
    pub fn get_application_services(&self, app_id: &str, app_version: &str) -> ApplicationServices {
        let inner = self.inner.read();
        let Some(config) = inner.applications.get(&AppKey::new(app_id, app_version)) else {
            return ApplicationServices {
                application: app_id.to_string(),
                version: app_version.to_string(),
                services: inner
                    .ordered_services()
                    .into_iter()
                    .map(|registration| ApplicationService {
                        registration,
                        required_version_range: None,
                        is_compatible: None,
                    })
                    .collect(),
                all_compatible: true,
                message: Some(format!(
                    "No configuration found for {app_id}@{app_version}, returning all registered services"
                )),
            };
        };

        let services: Vec<ApplicationService> = config
            .required_services
            .iter()
            .filter_map(|required| {
                let registration = inner.services.get(&required.service_id)?.clone();
                let compatible = version::satisfies(&registration.version, &required.version_range);
                Some(ApplicationService {
                    registration,
                    required_version_range: Some(required.version_range.clone()),
                    is_compatible: Some(compatible),
                })
            })
            .collect();

        let all_compatible = services
            .iter()
            .all(|service| service.is_compatible.unwrap_or(false));

        ApplicationServices {
            application: app_id.to_string(),
            version: app_version.to_string(),
            services,
            all_compatible,
            message: None,
        }
    }

    /// Current version of every service of an application release.
    pub fn get_application_versions(&self, app_id: &str, app_version: &str) -> ApplicationVersions {
        let services = self.get_application_services(app_id, app_version);
        ApplicationVersions {
            configured: services.message.is_none(),
            versions: services
                .services
                .into_iter()
                .map(|service| (service.registration.id, service.registration.version))
                .collect(),
            application: services.application,
            version: services.version,
        }
    }

    /// Checks caller-supplied versions against an application release.
    ///
    /// Results follow the order of `supplied`. Services the release does not
    /// require are reported as `unknown` and do not affect `all_valid`.
    pub fn validate_application_service_combination<I, K, V>(
        &self,
        app_id: &str,
        app_version: &str,
        supplied: I,
    ) -> CombinationValidation
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let inner = self.inner.read();
        let config = inner.applications.get(&AppKey::new(app_id, app_version));

        let mut all_valid = true;
        let results = supplied
            .into_iter()
            .map(|(service_id, supplied_version)| {
                let service_id: String = service_id.into();
                let supplied_version: String = supplied_version.into();
                let Some(required) = config.and_then(|config| config.requirement(&service_id))
                else {
                    return ServiceCheck {
                        service_id,
                        version: supplied_version,
                        status: CheckStatus::Unknown,
                        required_range: None,
                        message: "not required for this application version".to_string(),
                    };
                };

                let valid = version::satisfies(&supplied_version, &required.version_range);
                all_valid &= valid;
                ServiceCheck {
                    service_id,
                    version: supplied_version,
                    status: if valid {
                        CheckStatus::Valid
                    } else {
                        CheckStatus::Invalid
                    },
                    required_range: Some(required.version_range.clone()),
                    message: if valid {
                        format!("satisfies {}", required.version_range)
                    } else {
                        format!("does not satisfy {}", required.version_range)
                    },
                }
            })
            .collect();

        debug!(app_id, app_version, all_valid, "application combination validated");
        CombinationValidation {
            application: app_id.to_string(),
            version: app_version.to_string(),
            all_valid,
            results,
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
