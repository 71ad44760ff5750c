//! Intake endpoints: create and list patients and consultations.

use crate::error::ApiError;
use crate::AppState;
use api_shared::{
    Consultation, ConsultationSubmission, ErrorRes, HealthRes, HealthService, Patient,
    PatientSubmission,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used by monitoring and load balancer health checks. Does not touch the database.
#[axum::debug_handler]
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/patients",
    responses(
        (status = 200, description = "Registered patients, most recent first", body = [Patient]),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List all registered patients
///
/// # Returns
/// * `Ok(Json<Vec<Patient>>)` - Every patient, newest first; empty when none exist
///
/// # Errors
/// Returns `500 Internal Server Error` if the patients cannot be read.
#[axum::debug_handler]
pub async fn list_patients(State(state): State<AppState>) -> Result<Json<Vec<Patient>>, ApiError> {
    state
        .intake
        .patients()
        .list_all()
        .map(Json)
        .map_err(|e| ApiError::from_intake(e, "Failed to fetch patients"))
}

#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = PatientSubmission,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "Missing or unreadable fields", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Register a new patient
///
/// # Arguments
/// * `payload` - The registration form as JSON
///
/// # Returns
/// * `201 Created` with the stored patient, including its id and creation time
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body is not JSON,
/// - required fields are missing (all of them are listed in `missingFields`), or
/// - a field cannot be read (named in `field`).
///
/// Returns `500 Internal Server Error` if the patient cannot be stored.
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(payload) = payload?;
    let patient = state
        .intake
        .patients()
        .create(&payload)
        .map_err(|e| ApiError::from_intake(e, "Failed to create patient"))?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/api/consultations",
    responses(
        (status = 200, description = "Recorded consultations, most recent first", body = [Consultation]),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List all recorded consultations
#[axum::debug_handler]
pub async fn list_consultations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Consultation>>, ApiError> {
    state
        .intake
        .consultations()
        .list_all()
        .map(Json)
        .map_err(|e| ApiError::from_intake(e, "Failed to fetch consultations"))
}

#[utoipa::path(
    post,
    path = "/api/consultations",
    request_body = ConsultationSubmission,
    responses(
        (status = 201, description = "Consultation recorded", body = Consultation),
        (status = 400, description = "Body is not JSON, or configured required fields are missing", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Record a consultation
///
/// Numbers may be sent as strings. BMI and its category are always computed here from
/// height and weight; any values sent for them are ignored.
#[axum::debug_handler]
pub async fn create_consultation(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Consultation>), ApiError> {
    let Json(payload) = payload?;
    let consultation = state
        .intake
        .consultations()
        .create(&payload)
        .map_err(|e| ApiError::from_intake(e, "Failed to create consultation"))?;
    Ok((StatusCode::CREATED, Json(consultation)))
}
