//! # Clinic Core
//!
//! Core business logic for the clinic intake system.
//!
//! This crate contains pure data operations:
//! - BMI calculation and classification
//! - Required-field validation of intake submissions
//! - Patient and consultation storage in SQLite
//!
//! **No API concerns**: HTTP servers, routing and response shaping belong in `api-rest`.

pub mod bmi;
pub mod config;
pub mod constants;
pub mod error;
pub mod repositories;
pub mod storage;
pub mod validation;

pub use api_shared::{BmiStatus, Consultation, Patient};
pub use bmi::{classify, BmiReading};
pub use config::{
    database_location_from_env_value, field_list_from_env_value, CoreConfig, DatabaseLocation,
};
pub use constants::DEFAULT_DATABASE_PATH;
pub use error::{IntakeError, IntakeResult, ValidationError};
pub use repositories::consultations::{ConsultationRepository, NewConsultation};
pub use repositories::patients::{NewPatient, PatientRepository};
pub use storage::Storage;
pub use validation::{Entity, RequiredFields};

use std::sync::Arc;

/// Both intake repositories over one shared storage handle.
#[derive(Clone)]
pub struct IntakeService {
    storage: Arc<Storage>,
    patients: PatientRepository,
    consultations: ConsultationRepository,
}

impl IntakeService {
    /// Creates the service. The database is not opened until first use.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let storage = Arc::new(Storage::new(cfg.database().clone()));
        Self::with_storage(cfg, storage)
    }

    pub fn with_storage(cfg: Arc<CoreConfig>, storage: Arc<Storage>) -> Self {
        Self {
            patients: PatientRepository::new(cfg.clone(), storage.clone()),
            consultations: ConsultationRepository::new(cfg, storage.clone()),
            storage,
        }
    }

    pub fn patients(&self) -> &PatientRepository {
        &self.patients
    }

    pub fn consultations(&self) -> &ConsultationRepository {
        &self.consultations
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Closes the storage handle. Call once, after the server has stopped.
    pub fn shutdown(&self) -> IntakeResult<()> {
        self.storage.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repositories_share_one_storage_handle() {
        let service = IntakeService::new(Arc::new(CoreConfig::in_memory()));
        assert!(!service.storage().is_open());

        service
            .consultations()
            .create(&json!({ "patientName": "Test", "height": "170", "weight": "70" }))
            .unwrap();
        assert!(service.storage().is_open());
        assert!(service.patients().list_all().unwrap().is_empty());
        assert_eq!(service.consultations().list_all().unwrap().len(), 1);

        service.shutdown().unwrap();
        assert!(matches!(
            service.patients().list_all(),
            Err(IntakeError::StorageClosed)
        ));
    }
}
