use crate::types::HealthRes;

/// Simple health service shared by the REST API and its callers.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Clinic intake is alive".into(),
        }
    }
}
