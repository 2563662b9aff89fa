use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, RestConfig, app, core_config_from_env, serve};
use nhcx_core::terminology::{self, Terminology};

/// Main entry point for the NHCX insurance-plan service
///
/// Resolves configuration once, loads the terminology dictionary into the process-wide resolver
/// and serves the REST API with Swagger UI.
///
/// # Environment Variables
/// - `NHCX_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `NHCX_API_PREFIX`: Prefix for the FHIR routes (default: "/api/v1")
/// - `NHCX_TERMINOLOGY_PATH`: Terminology dictionary (default: `data/snomed_dictionary.json`)
/// - `NHCX_DEFAULT_LANGUAGE`: Bundle and plan language (default: "en-IN")
/// - `RUST_LOG`: Log filter (`nhcx=info` is always added)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("nhcx=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest = RestConfig::from_env();
    let cfg = Arc::new(core_config_from_env()?);
    let terminology = terminology::init_global(Terminology::load(cfg.terminology_path()));

    tracing::info!("++ Starting NHCX REST on {}{}", rest.addr, rest.api_prefix);

    let state = AppState::new(cfg, terminology);
    serve(&rest.addr, app(state, &rest.api_prefix)).await
}
