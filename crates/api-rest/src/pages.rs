//! The intake form pages.
//!
//! Plain HTML with a small inline script that posts the form as JSON to the intake API
//! and shows the outcome. The pages are compiled into the binary.

use axum::response::Html;

const INDEX: &str = include_str!("../static/index.html");
const PATIENT_FORM: &str = include_str!("../static/patients.html");
const CONSULTATION_FORM: &str = include_str!("../static/consultations.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX)
}

pub async fn patient_form() -> Html<&'static str> {
    Html(PATIENT_FORM)
}

pub async fn consultation_form() -> Html<&'static str> {
    Html(CONSULTATION_FORM)
}
