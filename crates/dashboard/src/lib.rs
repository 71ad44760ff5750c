//! # Clinic Dashboard
//!
//! Admin dashboard over the intake REST API.
//!
//! Polls the API for patients and consultations, keeps the latest snapshot in a
//! `watch` channel and renders it as text tables. The background refresh task lives as
//! long as the [`Dashboard`] does.

pub mod dashboard;
pub mod error;
pub mod render;
pub mod source;
pub mod state;

pub use dashboard::{Dashboard, DEFAULT_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL};
pub use error::{DashboardError, DashboardResult};
pub use render::render;
pub use source::{HttpIntakeSource, IntakeSource, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT};
pub use state::{DashboardStatus, DashboardView};
