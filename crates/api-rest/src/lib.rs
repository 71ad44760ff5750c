//! # API REST
//!
//! REST API implementation for the clinic intake system.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, error responses, CORS)
//! - the intake form pages
//!
//! Uses `api-shared` for wire types and `clinic-core` for validation and storage.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod intake;
pub mod pages;

use api_shared::{
    BmiStatus, Consultation, ConsultationSubmission, ErrorRes, HealthRes, Patient,
    PatientSubmission,
};
use axum::{routing::get, Router};
use clinic_core::{
    database_location_from_env_value, field_list_from_env_value, CoreConfig, IntakeService,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Default listen address when `CLINIC_REST_ADDR` is not set.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    pub intake: IntakeService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            intake: IntakeService::new(cfg),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        intake::health,
        intake::list_patients,
        intake::create_patient,
        intake::list_consultations,
        intake::create_consultation,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        Patient,
        PatientSubmission,
        Consultation,
        ConsultationSubmission,
        BmiStatus,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router: pages, API, OpenAPI document and Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/patients", get(pages::patient_form))
        .route("/consultations", get(pages::consultation_form))
        .route("/health", get(intake::health))
        .route(
            "/api/patients",
            get(intake::list_patients).post(intake::create_patient),
        )
        .route(
            "/api/consultations",
            get(intake::list_consultations).post(intake::create_consultation),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Server settings resolved from the environment at startup.
#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub addr: String,
    pub cfg: Arc<CoreConfig>,
}

impl ServerSettings {
    /// Reads the server settings from the process environment.
    ///
    /// # Environment Variables
    /// - `CLINIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
    /// - `CLINIC_DATABASE_PATH`: SQLite file, or `:memory:` (default: "clinic.db")
    /// - `PATIENT_REQUIRED_FIELDS`: Extra required patient fields, comma-separated
    /// - `CONSULTATION_REQUIRED_FIELDS`: Required consultation fields, comma-separated
    ///
    /// # Errors
    /// Returns an error if a required-field list names an unknown field.
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
        let database = database_location_from_env_value(std::env::var("CLINIC_DATABASE_PATH").ok());
        let cfg = CoreConfig::new(
            database,
            field_list_from_env_value(std::env::var("PATIENT_REQUIRED_FIELDS").ok()),
            field_list_from_env_value(std::env::var("CONSULTATION_REQUIRED_FIELDS").ok()),
        )?;
        Ok(Self {
            addr,
            cfg: Arc::new(cfg),
        })
    }
}

/// Runs the REST server until Ctrl-C or SIGTERM, then closes the database.
///
/// # Errors
/// Returns an error if:
/// - the server address cannot be bound,
/// - the HTTP server fails while running, or
/// - the database cannot be closed cleanly.
pub async fn serve(settings: ServerSettings) -> anyhow::Result<()> {
    tracing::info!("++ Starting clinic REST API on {}", settings.addr);
    tracing::info!("   database: {}", settings.cfg.database());

    let listener = tokio::net::TcpListener::bind(&settings.addr).await?;
    serve_until(listener, AppState::new(settings.cfg), shutdown_signal()).await
}

/// Serves on `listener` until `shutdown` resolves, then closes the database.
///
/// The database is closed whether the server stopped cleanly or failed; a server error
/// takes precedence over a close error.
pub async fn serve_until<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let intake = state.intake.clone();

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;
    if let Err(e) = &served {
        tracing::error!("server error: {:?}", e);
    }

    tracing::info!("-- Clinic REST API stopped, closing database");
    let closed = intake.shutdown();
    served?;
    closed?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-C handler error: {:?}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM handler error: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use clinic_core::IntakeError;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(Arc::new(CoreConfig::in_memory()))
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn registration() -> Value {
        serde_json::to_value(PatientSubmission {
            first_name: Some("Ivan".into()),
            last_name: Some("Petrenko".into()),
            date_of_birth: Some("1985-05-15".into()),
            gender: Some("male".into()),
            phone: Some("+380501234567".into()),
            address: Some("1 Khreshchatyk St".into()),
            city: Some("Kyiv".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn health_reports_alive() {
        let app = router(test_state());
        let response = send(&app, get_req("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["ok"], true);
    }

    #[tokio::test]
    async fn created_patient_appears_in_list() {
        let app = router(test_state());

        let response = send(&app, post_json("/api/patients", &registration())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert!(created["id"].as_i64().unwrap() > 0);
        assert!(created["createdAt"].is_string());

        let response = send(&app, get_req("/api/patients")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let listed = json_body(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0], created);
    }

    #[tokio::test]
    async fn patient_missing_city_is_rejected() {
        let state = test_state();
        let app = router(state.clone());
        let mut body = registration();
        body["city"] = Value::Null;

        let response = send(&app, post_json("/api/patients", &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Required fields are missing", "missingFields": ["city"] })
        );
        assert_eq!(state.intake.patients().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn unreadable_birth_date_names_the_field() {
        let app = router(test_state());
        let mut body = registration();
        body["dateOfBirth"] = json!("15.05.1985");

        let response = send(&app, post_json("/api/patients", &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["field"], "dateOfBirth");
    }

    #[tokio::test]
    async fn non_json_body_is_a_bad_request() {
        let app = router(test_state());
        let request = Request::builder()
            .method("POST")
            .uri("/api/patients")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("firstName=Ivan"))
            .unwrap();

        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn empty_store_lists_empty_arrays() {
        let app = router(test_state());
        for uri in ["/api/patients", "/api/consultations"] {
            let response = send(&app, get_req(uri)).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json_body(response).await, json!([]));
        }
    }

    #[tokio::test]
    async fn sequential_patient_posts_get_increasing_ids() {
        let app = router(test_state());
        let first = json_body(send(&app, post_json("/api/patients", &registration())).await).await;
        let second = json_body(send(&app, post_json("/api/patients", &registration())).await).await;
        assert!(second["id"].as_i64().unwrap() > first["id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn consultation_bmi_is_computed_server_side() {
        let app = router(test_state());
        let body = json!({
            "patientName": "Petrenko Ivan",
            "age": "40",
            "gender": "male",
            "height": "180",
            "weight": "85",
            "bmi": 99.9,
            "bmiStatus": "Obese",
            "hasEcg": true,
            "painLevel": "3"
        });

        let response = send(&app, post_json("/api/consultations", &body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["bmi"], 26.2);
        assert_eq!(created["bmiStatus"], "Overweight");
        assert_eq!(created["height"], 180);
        assert_eq!(created["painLevel"], 3);

        let listed = json_body(send(&app, get_req("/api/consultations")).await).await;
        assert_eq!(listed[0]["bmiStatus"], "Overweight");
    }

    #[tokio::test]
    async fn consultation_without_measurements_has_no_bmi() {
        let app = router(test_state());
        let response = send(&app, post_json("/api/consultations", &json!({}))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert!(created["bmi"].is_null());
        assert!(created["bmiStatus"].is_null());
    }

    #[tokio::test]
    async fn storage_failure_is_a_generic_internal_error() {
        let state = test_state();
        let app = router(state.clone());
        state.intake.shutdown().unwrap();

        let response = send(&app, get_req("/api/patients")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to fetch patients" })
        );

        let response = send(&app, post_json("/api/consultations", &json!({}))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to create consultation" })
        );
    }

    #[tokio::test]
    async fn form_pages_and_openapi_are_served() {
        let app = router(test_state());
        for uri in ["/", "/patients", "/consultations"] {
            let response = send(&app, get_req(uri)).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }

        let response = send(&app, get_req("/api-docs/openapi.json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/api/patients"]["post"].is_object());
        assert!(doc["paths"]["/api/consultations"]["get"].is_object());
    }

    #[tokio::test]
    async fn stopping_the_server_closes_the_database() {
        let state = test_state();
        let intake = state.intake.clone();
        intake.patients().create(&registration()).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        serve_until(listener, state, async {}).await.unwrap();

        assert!(!intake.storage().is_open());
        assert!(matches!(
            intake.patients().list_all(),
            Err(IntakeError::StorageClosed)
        ));
    }

    #[test]
    fn consultation_schema_documents_lenient_fields() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let fields = &doc["components"]["schemas"]["ConsultationSubmission"]["properties"];

        let flag = fields["hasGeneralExam"]["description"].as_str().unwrap();
        assert!(flag.contains("\"on\""));
        let height = fields["height"]["description"].as_str().unwrap();
        assert!(height.contains("String or number"));
    }

    #[tokio::test]
    async fn consultation_accepts_documented_encodings() {
        let app = router(test_state());
        let body = json!({
            "patientName": "Petrenko Ivan",
            "age": 40,
            "gender": "male",
            "height": "180",
            "weight": 85,
            "hasGeneralExam": "on",
            "hasEcg": 1,
            "hasMri": "YES",
            "painLevel": 4
        });

        let response = send(&app, post_json("/api/consultations", &body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["height"], 180);
        assert_eq!(created["weight"], 85);
        assert_eq!(created["hasGeneralExam"], true);
        assert_eq!(created["hasEcg"], true);
        assert_eq!(created["hasMri"], true);
        assert_eq!(created["hasLabTests"], false);
        assert_eq!(created["painLevel"], 4);
    }
}
