use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use versionmgr_compat::{
    validate_combination, ApplicationConfigInput, ApplicationInfo, ApplicationServices,
    ApplicationVersions, CatalogHandle, CombinationQuery, CombinationReport,
    CombinationValidation, CompatibilityEntry, MatrixDocument, PairCompatibility,
    RequiredService, ServiceDescriptor, ServiceRegistration, ServiceRegistry, ValidVersions,
};

use crate::auth::{require_token, RegistrationAuth};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Clone)]
struct ApiState {
    registry: ServiceRegistry,
    catalog: CatalogHandle,
}

/// Helper used by the binary and the tests to compose the REST API router.
#[derive(Clone)]
pub struct VersionApiBuilder {
    state: ApiState,
    auth: RegistrationAuth,
}

impl VersionApiBuilder {
    pub fn new(registry: ServiceRegistry, catalog: CatalogHandle) -> Self {
        Self {
            state: ApiState { registry, catalog },
            auth: RegistrationAuth::default(),
        }
    }

    pub fn with_auth(mut self, auth: RegistrationAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn into_router(self) -> Router {
        let guard = middleware::from_fn_with_state(self.auth, require_token);

        Router::new()
            .route("/health", get(health))
            .route("/api/version", get(application_version))
            .route("/api/versions", get(catalog_versions))
            .route("/api/compatibility", get(check_combination))
            .route(
                "/api/catalog/reload",
                post(reload_catalog).route_layer(guard.clone()),
            )
            .route(
                "/api/registry/register",
                post(register_service).route_layer(guard.clone()),
            )
            .route("/api/registry/services", get(list_services))
            .route(
                "/api/registry/services/:service_id",
                get(get_service).merge(delete(unregister_service).route_layer(guard.clone())),
            )
            .route(
                "/api/registry/services/:service_id/version",
                put(update_version).route_layer(guard.clone()),
            )
            .route(
                "/api/registry/services/:service_id/valid-versions",
                get(valid_versions),
            )
            .route(
                "/api/registry/compatibility",
                get(matrix_entries).merge(post(set_matrix).route_layer(guard.clone())),
            )
            .route("/api/registry/compatibility/validate", get(validate_pair))
            .route(
                "/api/registry/applications",
                post(set_application_config).route_layer(guard),
            )
            .route(
                "/api/registry/applications/:app_id/:version/services",
                get(application_services),
            )
            .route(
                "/api/registry/applications/:app_id/:version/versions",
                get(application_versions),
            )
            .route(
                "/api/registry/applications/:app_id/:version/validate",
                post(validate_application),
            )
            .with_state(self.state)
            .layer(TraceLayer::new_for_http())
    }
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let catalog = state.catalog.snapshot();
    Json(json!({
        "status": "ok",
        "registeredServices": state.registry.len(),
        "catalogVersion": catalog.application.as_ref().map(|app| app.version.clone()),
    }))
}

async fn application_version(State(state): State<ApiState>) -> ApiResult<Json<ApplicationInfo>> {
    let catalog = state.catalog.snapshot();
    Ok(Json(catalog.application()?.clone()))
}

async fn catalog_versions(State(state): State<ApiState>) -> ApiResult<Json<serde_json::Value>> {
    let catalog = state.catalog.snapshot();
    let application = catalog.application()?;
    Ok(Json(json!({
        "application": application,
        "services": catalog.services,
    })))
}

async fn check_combination(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<CombinationQuery>,
) -> ApiResult<Json<CombinationReport>> {
    let catalog = state.catalog.snapshot();
    Ok(Json(validate_combination(&catalog, &query)?))
}

async fn reload_catalog(State(state): State<ApiState>) -> ApiResult<Json<serde_json::Value>> {
    let catalog = state.catalog.reload()?;
    Ok(Json(json!({
        "message": "catalog reloaded",
        "path": state.catalog.path().map(|path| path.display().to_string()),
        "catalogVersion": catalog.application.as_ref().map(|app| app.version.clone()),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    service_id: Option<String>,
    #[serde(flatten)]
    descriptor: ServiceDescriptor,
}

async fn register_service(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ServiceRegistration>)> {
    let service_id = required(payload.service_id, "serviceId")?;
    let registration = state.registry.register(&service_id, payload.descriptor)?;
    Ok((StatusCode::CREATED, Json(registration)))
}

async fn list_services(State(state): State<ApiState>) -> Json<Vec<ServiceRegistration>> {
    Json(state.registry.list_all())
}

async fn get_service(
    State(state): State<ApiState>,
    ApiPath(service_id): ApiPath<String>,
) -> ApiResult<Json<ServiceRegistration>> {
    state
        .registry
        .get(&service_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("service {service_id} not found")))
}

async fn unregister_service(
    State(state): State<ApiState>,
    ApiPath(service_id): ApiPath<String>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.registry.unregister(&service_id) {
        return Err(ApiError::not_found(format!("service {service_id} not found")));
    }
    Ok(Json(json!({
        "message": format!("service {service_id} unregistered"),
        "id": service_id,
    })))
}

#[derive(Debug, Deserialize)]
struct UpdateVersionRequest {
    #[serde(default)]
    version: Option<String>,
}

async fn update_version(
    State(state): State<ApiState>,
    ApiPath(service_id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateVersionRequest>,
) -> ApiResult<Json<ServiceRegistration>> {
    let version = required(payload.version, "version")?;
    Ok(Json(state.registry.update_version(&service_id, &version)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidVersionsQuery {
    #[serde(default)]
    dependent_service: Option<String>,
    #[serde(default)]
    dependent_version: Option<String>,
}

async fn valid_versions(
    State(state): State<ApiState>,
    ApiPath(target): ApiPath<String>,
    ApiQuery(query): ApiQuery<ValidVersionsQuery>,
) -> ApiResult<Json<ValidVersions>> {
    let dependent = required(query.dependent_service, "dependentService")?;
    let dependent_version = required(query.dependent_version, "dependentVersion")?;
    let result =
        state
            .registry
            .get_valid_versions_for_service(&target, &dependent, &dependent_version)?;
    Ok(Json(result))
}

async fn matrix_entries(
    State(state): State<ApiState>,
) -> Json<BTreeMap<String, CompatibilityEntry>> {
    Json(state.registry.matrix_entries())
}

async fn set_matrix(
    State(state): State<ApiState>,
    ApiJson(document): ApiJson<MatrixDocument>,
) -> ApiResult<Json<serde_json::Value>> {
    let entries = state.registry.set_compatibility_matrix(document)?;
    Ok(Json(json!({
        "message": "compatibility matrix updated",
        "entries": entries,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairQuery {
    #[serde(default)]
    service_a: Option<String>,
    #[serde(default)]
    version_a: Option<String>,
    #[serde(default)]
    service_b: Option<String>,
    #[serde(default)]
    version_b: Option<String>,
}

async fn validate_pair(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<PairQuery>,
) -> ApiResult<Json<PairCompatibility>> {
    let service_a = required(query.service_a, "serviceA")?;
    let version_a = required(query.version_a, "versionA")?;
    let service_b = required(query.service_b, "serviceB")?;
    let version_b = required(query.version_b, "versionB")?;
    Ok(Json(state.registry.validate_compatibility(
        &service_a, &version_a, &service_b, &version_b,
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationConfigRequest {
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    application_version: Option<String>,
    #[serde(default)]
    required_services: Vec<RequiredService>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationConfigAck {
    message: String,
    application: String,
    version: String,
    required_services: usize,
    last_updated: chrono::DateTime<chrono::Utc>,
}

async fn set_application_config(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<ApplicationConfigRequest>,
) -> ApiResult<Json<ApplicationConfigAck>> {
    let app_id = required(payload.app_id, "appId")?;
    let version = required(payload.application_version, "applicationVersion")?;
    let config = state.registry.set_application_config(
        &app_id,
        &version,
        ApplicationConfigInput {
            required_services: payload.required_services,
        },
    )?;

    Ok(Json(ApplicationConfigAck {
        message: format!("configuration stored for {app_id}@{version}"),
        required_services: config.required_services.len(),
        last_updated: config.last_updated,
        application: app_id,
        version,
    }))
}

async fn application_services(
    State(state): State<ApiState>,
    ApiPath((app_id, version)): ApiPath<(String, String)>,
) -> Json<ApplicationServices> {
    Json(state.registry.get_application_services(&app_id, &version))
}

async fn application_versions(
    State(state): State<ApiState>,
    ApiPath((app_id, version)): ApiPath<(String, String)>,
) -> Json<ApplicationVersions> {
    Json(state.registry.get_application_versions(&app_id, &version))
}

#[derive(Debug, Deserialize)]
struct ValidateApplicationRequest {
    // keeps the caller's key order
    #[serde(default)]
    services: serde_json::Map<String, serde_json::Value>,
}

async fn validate_application(
    State(state): State<ApiState>,
    ApiPath((app_id, version)): ApiPath<(String, String)>,
    ApiJson(payload): ApiJson<ValidateApplicationRequest>,
) -> ApiResult<Json<CombinationValidation>> {
    let supplied = payload
        .services
        .into_iter()
        .map(|(service_id, value)| match value {
            serde_json::Value::String(version) => Ok((service_id, version)),
            _ => Err(ApiError::bad_request(format!(
                "services.{service_id} must be a version string"
            ))),
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(state.registry.validate_application_service_combination(
        &app_id, &version, supplied,
    )))
}

fn required(value: Option<String>, field: &'static str) -> ApiResult<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::missing_field(field))
}
