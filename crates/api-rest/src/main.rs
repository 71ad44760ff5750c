//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the intake REST API (with OpenAPI/Swagger UI and the form pages) on its own.
//!
//! ## Intended use
//! Useful for development when only the server is wanted. The workspace's main
//! `clinic-run` binary serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the clinic REST API server
///
/// See [`api_rest::ServerSettings::from_env`] for the environment variables read.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = api_rest::ServerSettings::from_env()?;
    api_rest::serve(settings).await
}
