//! HTTP error responses.
//!
//! Every failing endpoint answers with an [`ErrorRes`] JSON body. Client mistakes are
//! described in detail; storage failures get a generic message and the detail goes to the
//! server log only.

use api_shared::ErrorRes;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use clinic_core::IntakeError;

#[derive(Debug)]
pub enum ApiError {
    /// Required fields were absent or blank.
    MissingFields(Vec<String>),
    /// A field was present but could not be read.
    InvalidField { field: String, reason: String },
    /// The body was not JSON at all.
    MalformedBody(String),
    /// Storage or configuration failure. Carries the public message only.
    Internal(&'static str),
}

impl ApiError {
    /// Maps a core error onto a response.
    ///
    /// `context` is the public message used when the failure is on the server side, for
    /// example `"Failed to fetch patients"`.
    pub fn from_intake(err: IntakeError, context: &'static str) -> Self {
        match err {
            IntakeError::Validation(v) => ApiError::MissingFields(v.missing),
            IntakeError::InvalidField { field, reason } => ApiError::InvalidField { field, reason },
            other => {
                tracing::error!("{} error: {:?}", context, other);
                ApiError::Internal(context)
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn body(self) -> ErrorRes {
        match self {
            ApiError::MissingFields(missing) => ErrorRes {
                missing_fields: missing,
                ..ErrorRes::new("Required fields are missing")
            },
            ApiError::InvalidField { field, reason } => ErrorRes {
                field: Some(field),
                ..ErrorRes::new(reason)
            },
            ApiError::MalformedBody(reason) => ErrorRes::new(reason),
            ApiError::Internal(message) => ErrorRes::new(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}
