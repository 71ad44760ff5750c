//! # API Shared
//!
//! Shared definitions for the clinic intake API.
//!
//! Contains:
//! - Wire types (`types` module) used by the REST API and the admin dashboard
//! - Shared services like `HealthService`
//!
//! Used by `clinic-core`, `api-rest` and `clinic-dashboard`.

pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
