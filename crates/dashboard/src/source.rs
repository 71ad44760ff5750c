//! Where the dashboard gets its records from.

use crate::error::{DashboardError, DashboardResult};
use api_shared::{Consultation, ErrorRes, Patient};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default base URL of the intake API.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Upper bound on a single request, connect to last body byte.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Read access to the intake records.
#[async_trait]
pub trait IntakeSource: Send + Sync {
    async fn fetch_patients(&self) -> DashboardResult<Vec<Patient>>;
    async fn fetch_consultations(&self) -> DashboardResult<Vec<Consultation>>;
}

/// Reads records from a running intake API over HTTP.
#[derive(Clone, Debug)]
pub struct HttpIntakeSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIntakeSource {
    /// Creates a source with [`DEFAULT_REQUEST_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Request` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> DashboardResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a source whose requests fail once `timeout` has elapsed, so an API that
    /// accepts connections but never answers cannot stall the dashboard.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> DashboardResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> DashboardResult<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorRes>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(DashboardError::Api {
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl IntakeSource for HttpIntakeSource {
    async fn fetch_patients(&self) -> DashboardResult<Vec<Patient>> {
        self.get_json("/api/patients").await
    }

    async fn fetch_consultations(&self) -> DashboardResult<Vec<Consultation>> {
        self.get_json("/api/consultations").await
    }
}
