//! Patient registration storage.
//!
//! Patients are created once from an intake submission and never updated or deleted.
//! A submission passes through two gates before it reaches the database:
//!
//! 1. the configured [`RequiredFields`] check, which reports every missing field at once;
//! 2. typed parsing into [`NewPatient`], which rejects values that are present but
//!    unusable (for example a date of birth that is not a date).

use crate::config::CoreConfig;
use crate::constants::PATIENTS_TABLE;
use crate::error::{IntakeError, IntakeResult};
use crate::repositories::helpers;
use crate::storage::Storage;
use crate::validation::Entity;
use api_shared::Patient;
use chrono::{NaiveDate, Utc};
use intake_types::NonEmptyText;
use rusqlite::{params, Row};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const SELECT_COLUMNS: &str = r#"
    SELECT id, first_name, last_name, middle_name, date_of_birth, gender, phone, email,
           address, city, postal_code, emergency_contact, emergency_phone,
           medical_history, allergies, medications, created_at
    FROM patients
"#;

/// A validated patient submission, ready to persist.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    #[serde(deserialize_with = "helpers::required_text")]
    pub first_name: NonEmptyText,
    #[serde(deserialize_with = "helpers::required_text")]
    pub last_name: NonEmptyText,
    #[serde(default, deserialize_with = "helpers::optional_text")]
    pub middle_name: Option<String>,
    #[serde(deserialize_with = "helpers::birth_date")]
    pub date_of_birth: NaiveDate,
    #[serde(deserialize_with = "helpers::required_text")]
    pub gender: NonEmptyText,
    #[serde(deserialize_with = "helpers::required_text")]
    pub phone: NonEmptyText,
    #[serde(default, deserialize_with = "helpers::optional_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "helpers::required_text")]
    pub address: NonEmptyText,
    #[serde(deserialize_with = "helpers::required_text")]
    pub city: NonEmptyText,
    #[serde(default, deserialize_with = "helpers::optional_text")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "helpers::optional_text")]
    pub emergency_contact: Option<String>,
    #[serde(default, deserialize_with = "helpers::optional_text")]
    pub emergency_phone: Option<String>,
    #[serde(default, deserialize_with = "helpers::optional_text")]
    pub medical_history: Option<String>,
    #[serde(default, deserialize_with = "helpers::optional_text")]
    pub allergies: Option<String>,
    #[serde(default, deserialize_with = "helpers::optional_text")]
    pub medications: Option<String>,
}

impl NewPatient {
    /// Parses an already-validated JSON object.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidField` naming the first field that could not be read.
    pub fn from_payload(payload: &Value) -> IntakeResult<Self> {
        serde_path_to_error::deserialize(payload.clone()).map_err(|e| {
            let field = e.path().to_string();
            IntakeError::InvalidField {
                field,
                reason: e.into_inner().to_string(),
            }
        })
    }
}

/// Create/list operations over registered patients.
#[derive(Clone)]
pub struct PatientRepository {
    cfg: Arc<CoreConfig>,
    storage: Arc<Storage>,
}

impl PatientRepository {
    pub fn new(cfg: Arc<CoreConfig>, storage: Arc<Storage>) -> Self {
        Self { cfg, storage }
    }

    /// Validates and stores a patient submission.
    ///
    /// # Arguments
    ///
    /// * `payload` - The raw JSON body of the registration form.
    ///
    /// # Returns
    ///
    /// The stored patient with its assigned id and creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError` if:
    /// - required fields are missing (`Validation`); nothing is persisted,
    /// - a field is present but unreadable (`InvalidField`); nothing is persisted,
    /// - the insert fails (`Storage`, `StorageClosed`, `LockPoisoned`).
    pub fn create(&self, payload: &Value) -> IntakeResult<Patient> {
        self.cfg
            .required_fields(Entity::Patient)
            .validate(payload)?;
        let new_patient = NewPatient::from_payload(payload)?;
        self.insert(new_patient)
    }

    /// Stores an already-parsed patient.
    pub fn insert(&self, new_patient: NewPatient) -> IntakeResult<Patient> {
        let created_at = Utc::now();

        let id = self.storage.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO patients (
                    first_name, last_name, middle_name, date_of_birth, gender, phone, email,
                    address, city, postal_code, emergency_contact, emergency_phone,
                    medical_history, allergies, medications, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                "#,
                params![
                    new_patient.first_name.as_str(),
                    new_patient.last_name.as_str(),
                    new_patient.middle_name,
                    new_patient.date_of_birth,
                    new_patient.gender.as_str(),
                    new_patient.phone.as_str(),
                    new_patient.email,
                    new_patient.address.as_str(),
                    new_patient.city.as_str(),
                    new_patient.postal_code,
                    new_patient.emergency_contact,
                    new_patient.emergency_phone,
                    new_patient.medical_history,
                    new_patient.allergies,
                    new_patient.medications,
                    created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        tracing::info!(patient_id = id, "patient registered");

        Ok(Patient {
            id,
            first_name: new_patient.first_name.into_inner(),
            last_name: new_patient.last_name.into_inner(),
            middle_name: new_patient.middle_name,
            date_of_birth: new_patient.date_of_birth,
            gender: new_patient.gender.into_inner(),
            phone: new_patient.phone.into_inner(),
            email: new_patient.email,
            address: new_patient.address.into_inner(),
            city: new_patient.city.into_inner(),
            postal_code: new_patient.postal_code,
            emergency_contact: new_patient.emergency_contact,
            emergency_phone: new_patient.emergency_phone,
            medical_history: new_patient.medical_history,
            allergies: new_patient.allergies,
            medications: new_patient.medications,
            created_at,
        })
    }

    /// Lists every patient, most recently registered first.
    ///
    /// An empty store yields an empty vector.
    pub fn list_all(&self) -> IntakeResult<Vec<Patient>> {
        self.storage.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], patient_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
    }

    pub fn count(&self) -> IntakeResult<i64> {
        self.storage.with_connection(|conn| {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM {PATIENTS_TABLE}"),
                [],
                |row| row.get(0),
            )
        })
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        middle_name: row.get(3)?,
        date_of_birth: row.get(4)?,
        gender: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        address: row.get(8)?,
        city: row.get(9)?,
        postal_code: row.get(10)?,
        emergency_contact: row.get(11)?,
        emergency_phone: row.get(12)?,
        medical_history: row.get(13)?,
        allergies: row.get(14)?,
        medications: row.get(15)?,
        created_at: row.get(16)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseLocation;
    use serde_json::json;

    fn test_repository() -> PatientRepository {
        PatientRepository::new(
            Arc::new(CoreConfig::in_memory()),
            Arc::new(Storage::in_memory()),
        )
    }

    fn registration() -> Value {
        json!({
            "firstName": "Ivan",
            "lastName": "Petrenko",
            "middleName": "Oleksandrovych",
            "dateOfBirth": "1985-05-15",
            "gender": "male",
            "phone": "+380501234567",
            "email": "ivan.petrenko@email.com",
            "address": "1 Khreshchatyk St",
            "city": "Kyiv",
            "postalCode": "",
            "allergies": "penicillin"
        })
    }

    #[test]
    fn create_then_list_includes_record_once() {
        let repo = test_repository();
        let created = repo.create(&registration()).expect("create should succeed");

        assert!(created.id > 0);
        assert_eq!(created.first_name, "Ivan");
        assert_eq!(created.postal_code, None, "blank optional text is stored as absent");
        assert_eq!(created.allergies.as_deref(), Some("penicillin"));

        let patients = repo.list_all().unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0], created);
    }

    #[test]
    fn missing_city_is_rejected_and_nothing_persisted() {
        let repo = test_repository();
        let mut payload = registration();
        payload.as_object_mut().unwrap().remove("city");

        let err = repo.create(&payload).unwrap_err();
        match err {
            IntakeError::Validation(v) => assert_eq!(v.missing, vec!["city"]),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn every_missing_field_is_reported() {
        let repo = test_repository();
        let err = repo.create(&json!({ "firstName": "Ivan" })).unwrap_err();
        match err {
            IntakeError::Validation(v) => assert_eq!(
                v.missing,
                vec!["lastName", "dateOfBirth", "gender", "phone", "address", "city"]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_birth_date_is_an_invalid_field() {
        let repo = test_repository();
        let mut payload = registration();
        payload["dateOfBirth"] = json!("yesterday");

        let err = repo.create(&payload).unwrap_err();
        assert!(err.is_client_error());
        match err {
            IntakeError::InvalidField { field, .. } => assert_eq!(field, "dateOfBirth"),
            other => panic!("expected invalid field, got {other:?}"),
        }
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn sequential_creates_get_increasing_ids() {
        let repo = test_repository();
        let first = repo.create(&registration()).unwrap();
        let second = repo.create(&registration()).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn list_is_most_recent_first() {
        let repo = test_repository();
        let first = repo.create(&registration()).unwrap();
        let mut payload = registration();
        payload["firstName"] = json!("Olena");
        let second = repo.create(&payload).unwrap();

        let ids: Vec<i64> = repo.list_all().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn empty_store_lists_nothing() {
        let repo = test_repository();
        assert!(repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn extra_required_fields_are_enforced() {
        let cfg = CoreConfig::new(DatabaseLocation::InMemory, vec!["email".into()], vec![])
            .unwrap();
        let repo = PatientRepository::new(Arc::new(cfg), Arc::new(Storage::in_memory()));
        let mut payload = registration();
        payload["email"] = json!("");

        let err = repo.create(&payload).unwrap_err();
        assert!(matches!(err, IntakeError::Validation(v) if v.missing == vec!["email"]));
    }

    #[test]
    fn closed_storage_is_a_storage_error() {
        let storage = Arc::new(Storage::in_memory());
        let repo = PatientRepository::new(Arc::new(CoreConfig::in_memory()), storage.clone());
        storage.close().unwrap();

        let err = repo.create(&registration()).unwrap_err();
        assert!(matches!(err, IntakeError::StorageClosed));
        assert!(!err.is_client_error());
    }
}
