use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the clinic intake application
///
/// Serves the intake REST API, the form pages and the OpenAPI documentation on one
/// address. Shuts down gracefully on Ctrl-C or SIGTERM and closes the database.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATABASE_PATH`: SQLite database file, or `:memory:` (default: "clinic.db")
/// - `PATIENT_REQUIRED_FIELDS`: Extra required patient fields, comma-separated
/// - `CONSULTATION_REQUIRED_FIELDS`: Required consultation fields, comma-separated
///
/// A `.env` file in the working directory is loaded first, if present.
///
/// # Returns
/// * `Ok(())` - If the server starts, runs and stops cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or shutdown fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = api_rest::ServerSettings::from_env()?;
    api_rest::serve(settings).await
}
