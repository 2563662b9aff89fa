//! # API REST
//!
//! REST API for the NHCX insurance-plan bundle generator.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, error envelopes, CORS)
//!
//! Mapping, validation and summaries live in `nhcx-core`; handlers here only adapt them to HTTP.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use nhcx_core::{
    summarize_bundle, validate_bundle, CoreConfig, InsurancePlanMapper, Terminology,
};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

const ERROR_CODE_INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";
const ERROR_CODE_MAPPING_ERROR: &str = "MAPPING_ERROR";
const ERROR_CODE_VALIDATION_ERROR: &str = "VALIDATION_ERROR";
const ERROR_CODE_SUMMARY_ERROR: &str = "SUMMARY_ERROR";

/// Server settings read from the environment at startup.
#[derive(Clone, Debug)]
pub struct RestConfig {
    pub addr: String,
    pub api_prefix: String,
}

impl RestConfig {
    /// Reads `NHCX_REST_ADDR` and `NHCX_API_PREFIX`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self {
            addr: std::env::var("NHCX_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into()),
            api_prefix: std::env::var("NHCX_API_PREFIX")
                .unwrap_or_else(|_| DEFAULT_API_PREFIX.into()),
        }
    }
}

/// Builds the [`CoreConfig`] from `NHCX_TERMINOLOGY_PATH` and `NHCX_DEFAULT_LANGUAGE`.
///
/// # Errors
/// Returns an error if the configured language is not a usable language tag.
pub fn core_config_from_env() -> anyhow::Result<CoreConfig> {
    let override_path = std::env::var("NHCX_TERMINOLOGY_PATH").ok().map(PathBuf::from);
    let terminology_path = nhcx_core::config::resolve_terminology_path(override_path);
    let language = std::env::var("NHCX_DEFAULT_LANGUAGE")
        .unwrap_or_else(|_| nhcx_core::constants::DEFAULT_LANGUAGE.into());
    Ok(CoreConfig::new(terminology_path, language)?)
}

/// Application state for the REST API server
///
/// The terminology dictionary is loaded once per process and shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    terminology: &'static Terminology,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, terminology: &'static Terminology) -> Self {
        Self { cfg, terminology }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
    pub components: HealthComponents,
    pub api_version: String,
    pub timestamp: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthComponents {
    pub terminology: TerminologyHealth,
}

#[derive(Serialize, ToSchema)]
pub struct TerminologyHealth {
    /// `ok` when the dictionary has entries, `empty` when codes pass through unresolved.
    pub status: String,
    pub codes: usize,
    pub terms: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error envelope returned with `400 Bad Request`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: ErrorDetail,
}

/// A request the API refuses, rendered as an [`ErrorRes`] body.
#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorRes {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Unwraps a JSON body that must be an object, reporting failures under `code`.
fn json_object(
    body: Result<Json<Value>, JsonRejection>,
    code: &'static str,
) -> Result<Value, ApiError> {
    let Json(value) = body.map_err(|rejection| {
        tracing::warn!("rejected request body: {rejection}");
        ApiError::new(ERROR_CODE_INVALID_PAYLOAD, rejection.body_text())
    })?;
    if !value.is_object() {
        return Err(ApiError::new(code, "request body must be a JSON object"));
    }
    Ok(value)
}

#[derive(OpenApi)]
#[openapi(
    paths(health, generate_insurance_plan, validate, bundle_summary),
    components(schemas(HealthRes, HealthComponents, TerminologyHealth, ErrorRes, ErrorDetail))
)]
pub struct ApiDoc;

/// Routes without middleware. FHIR routes are nested under `api_prefix`.
pub fn router(state: AppState, api_prefix: &str) -> Router {
    let fhir = Router::new()
        .route("/fhir/insurance-plan", post(generate_insurance_plan))
        .route("/fhir/validate", post(validate))
        .route("/fhir/bundle-summary", post(bundle_summary));

    let prefix = api_prefix.trim().trim_end_matches('/');
    let routes = Router::new().route("/health", get(health));
    let routes = if prefix.is_empty() {
        routes.merge(fhir)
    } else if prefix.starts_with('/') {
        routes.nest(prefix, fhir)
    } else {
        routes.nest(&format!("/{prefix}"), fhir)
    };

    routes.with_state(state)
}

/// Full application: routes, Swagger UI and permissive CORS.
pub fn app(state: AppState, api_prefix: &str) -> Router {
    router(state, api_prefix)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
}

/// Binds `addr` and serves `app` until the server stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Reports whether the terminology dictionary loaded. An empty dictionary still serves requests,
/// so the service reports itself `degraded` rather than failing.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    let codes = state.terminology.code_count();
    let terms = state.terminology.term_count();
    let loaded = codes > 0 || terms > 0;
    Json(HealthRes {
        status: if loaded { "healthy" } else { "degraded" }.into(),
        components: HealthComponents {
            terminology: TerminologyHealth {
                status: if loaded { "ok" } else { "empty" }.into(),
                codes,
                terms,
            },
        },
        api_version: env!("CARGO_PKG_VERSION").into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/fhir/insurance-plan",
    request_body = Object,
    responses(
        (status = 200, description = "InsurancePlan bundle", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Map an extracted insurance-plan record to a FHIR collection Bundle
///
/// The record is the loose JSON produced by document extraction. Data-quality problems inside the
/// record are logged and degraded locally; only a body that is not a JSON object is refused.
#[axum::debug_handler]
async fn generate_insurance_plan(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let record = json_object(body, ERROR_CODE_MAPPING_ERROR)?;
    let report = InsurancePlanMapper::new(state.terminology, &state.cfg).generate_report(&record);
    tracing::info!(
        state = ?report.state,
        warnings = report.warnings.len(),
        "generated insurance-plan bundle"
    );
    Ok(Json(report.document))
}

#[utoipa::path(
    post,
    path = "/api/v1/fhir/validate",
    request_body = Object,
    responses(
        (status = 200, description = "Validation report", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Check a bundle document for the shape an insurance-plan bundle must have
async fn validate(body: Result<Json<Value>, JsonRejection>) -> Result<Response, ApiError> {
    let bundle = json_object(body, ERROR_CODE_VALIDATION_ERROR)?;
    let report = validate_bundle(&bundle);
    if !report.valid {
        tracing::info!(issues = report.issue_count, "bundle failed validation");
    }
    Ok(Json(report).into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/fhir/bundle-summary",
    request_body = Object,
    responses(
        (status = 200, description = "Bundle summary", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Summarise the plan, organizations and benefits held in a bundle document
async fn bundle_summary(body: Result<Json<Value>, JsonRejection>) -> Result<Response, ApiError> {
    let bundle = json_object(body, ERROR_CODE_SUMMARY_ERROR)?;
    Ok(Json(summarize_bundle(&bundle)).into_response())
}
