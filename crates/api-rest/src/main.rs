//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, with OpenAPI/Swagger UI.
//!
//! ## Intended use
//! Useful during development when only the HTTP surface is needed. The workspace's main
//! `nhcx-run` binary serves the same application.

use api_rest::{app, core_config_from_env, serve, AppState, RestConfig};
use nhcx_core::terminology::{self, Terminology};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the NHCX REST API server
///
/// # Environment Variables
/// - `NHCX_REST_ADDR`: Server address (default: "0.0.0.0:8000")
/// - `NHCX_API_PREFIX`: Prefix for the FHIR routes (default: "/api/v1")
/// - `NHCX_TERMINOLOGY_PATH`: Terminology dictionary file
/// - `NHCX_DEFAULT_LANGUAGE`: Language for bundles and plans (default: "en-IN")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configured language is not a language tag, or
/// - the server address cannot be bound or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest = RestConfig::from_env();
    let cfg = Arc::new(core_config_from_env()?);
    let terminology = terminology::init_global(Terminology::load(cfg.terminology_path()));

    tracing::info!("-- Starting NHCX REST API on {}", rest.addr);

    let state = AppState::new(cfg, terminology);
    serve(&rest.addr, app(state, &rest.api_prefix)).await
}
