//! Consultation intake storage.
//!
//! Consultation forms are permissive: numeric fields arrive as strings and fall back to 0
//! when unreadable, flags fall back to false, and by default no field is required. BMI and
//! its category are always derived here from the parsed height and weight; any values a
//! caller sends for them are ignored.

use crate::bmi::BmiReading;
use crate::config::CoreConfig;
use crate::constants::CONSULTATIONS_TABLE;
use crate::error::{IntakeError, IntakeResult};
use crate::repositories::helpers;
use crate::storage::Storage;
use crate::validation::Entity;
use api_shared::{BmiStatus, Consultation};
use chrono::Utc;
use intake_types::PainLevel;
use rusqlite::types::Type;
use rusqlite::{params, Row};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const SELECT_COLUMNS: &str = r#"
    SELECT id, patient_name, age, gender, phone, height, weight, bmi, bmi_status, complaints,
           has_general_exam, has_lab_tests, has_ecg, has_x_ray, has_ultrasound, has_ct, has_mri,
           has_chronic_diseases, takes_medications, has_allergies, pain_level,
           additional_notes, created_at
    FROM consultations
"#;

/// A parsed consultation submission.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewConsultation {
    #[serde(deserialize_with = "helpers::lenient_text")]
    pub patient_name: String,
    #[serde(deserialize_with = "helpers::lenient_int")]
    pub age: i64,
    #[serde(deserialize_with = "helpers::lenient_text")]
    pub gender: String,
    #[serde(deserialize_with = "helpers::lenient_optional_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "helpers::lenient_int")]
    pub height: i64,
    #[serde(deserialize_with = "helpers::lenient_int")]
    pub weight: i64,
    #[serde(deserialize_with = "helpers::lenient_optional_text")]
    pub complaints: Option<String>,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_general_exam: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_lab_tests: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_ecg: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_x_ray: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_ultrasound: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_ct: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_mri: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_chronic_diseases: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub takes_medications: bool,
    #[serde(deserialize_with = "helpers::lenient_flag")]
    pub has_allergies: bool,
    #[serde(deserialize_with = "helpers::lenient_int")]
    pub pain_level: i64,
    #[serde(deserialize_with = "helpers::lenient_optional_text")]
    pub additional_notes: Option<String>,
}

impl NewConsultation {
    /// Parses a JSON object. Every field is lenient, so only a non-object body fails.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidField` if `payload` is not a JSON object.
    pub fn from_payload(payload: &Value) -> IntakeResult<Self> {
        serde_path_to_error::deserialize(payload.clone()).map_err(|e| {
            IntakeError::InvalidField {
                field: e.path().to_string(),
                reason: e.into_inner().to_string(),
            }
        })
    }

    /// The BMI reading, when both measurements are positive.
    pub fn bmi(&self) -> Option<BmiReading> {
        BmiReading::for_measurements(self.height as f64, self.weight as f64)
    }
}

/// Create/list operations over recorded consultations.
#[derive(Clone)]
pub struct ConsultationRepository {
    cfg: Arc<CoreConfig>,
    storage: Arc<Storage>,
}

impl ConsultationRepository {
    pub fn new(cfg: Arc<CoreConfig>, storage: Arc<Storage>) -> Self {
        Self { cfg, storage }
    }

    /// Parses and stores a consultation submission.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Validation` only when the configuration requires fields for
    /// consultations; otherwise fails only on storage errors.
    pub fn create(&self, payload: &Value) -> IntakeResult<Consultation> {
        self.cfg
            .required_fields(Entity::Consultation)
            .validate(payload)?;
        let new_consultation = NewConsultation::from_payload(payload)?;
        self.insert(new_consultation)
    }

    /// Stores an already-parsed consultation, deriving BMI and clamping the pain level.
    pub fn insert(&self, new_consultation: NewConsultation) -> IntakeResult<Consultation> {
        let reading = new_consultation.bmi();
        let bmi = reading.map(|r| r.bmi);
        let bmi_status = reading.map(|r| r.status);
        let pain_level = PainLevel::clamped(new_consultation.pain_level).value();
        let created_at = Utc::now();
        let c = &new_consultation;

        let id = self.storage.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO consultations (
                    patient_name, age, gender, phone, height, weight, bmi, bmi_status,
                    complaints, has_general_exam, has_lab_tests, has_ecg, has_x_ray,
                    has_ultrasound, has_ct, has_mri, has_chronic_diseases, takes_medications,
                    has_allergies, pain_level, additional_notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                          ?16, ?17, ?18, ?19, ?20, ?21, ?22)
                "#,
                params![
                    c.patient_name,
                    c.age,
                    c.gender,
                    c.phone,
                    c.height,
                    c.weight,
                    bmi,
                    bmi_status.map(BmiStatus::label),
                    c.complaints,
                    c.has_general_exam,
                    c.has_lab_tests,
                    c.has_ecg,
                    c.has_x_ray,
                    c.has_ultrasound,
                    c.has_ct,
                    c.has_mri,
                    c.has_chronic_diseases,
                    c.takes_medications,
                    c.has_allergies,
                    pain_level,
                    c.additional_notes,
                    created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        tracing::info!(consultation_id = id, bmi = ?bmi, "consultation recorded");

        Ok(Consultation {
            id,
            patient_name: new_consultation.patient_name,
            age: new_consultation.age,
            gender: new_consultation.gender,
            phone: new_consultation.phone,
            height: new_consultation.height,
            weight: new_consultation.weight,
            bmi,
            bmi_status,
            complaints: new_consultation.complaints,
            has_general_exam: new_consultation.has_general_exam,
            has_lab_tests: new_consultation.has_lab_tests,
            has_ecg: new_consultation.has_ecg,
            has_x_ray: new_consultation.has_x_ray,
            has_ultrasound: new_consultation.has_ultrasound,
            has_ct: new_consultation.has_ct,
            has_mri: new_consultation.has_mri,
            has_chronic_diseases: new_consultation.has_chronic_diseases,
            takes_medications: new_consultation.takes_medications,
            has_allergies: new_consultation.has_allergies,
            pain_level,
            additional_notes: new_consultation.additional_notes,
            created_at,
        })
    }

    /// Lists every consultation, most recently recorded first.
    pub fn list_all(&self) -> IntakeResult<Vec<Consultation>> {
        self.storage.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], consultation_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
    }

    pub fn count(&self) -> IntakeResult<i64> {
        self.storage.with_connection(|conn| {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM {CONSULTATIONS_TABLE}"),
                [],
                |row| row.get(0),
            )
        })
    }
}

fn consultation_from_row(row: &Row<'_>) -> rusqlite::Result<Consultation> {
    let bmi_status = row
        .get::<_, Option<String>>(8)?
        .map(|s| {
            s.parse::<BmiStatus>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, e.into()))
        })
        .transpose()?;

    Ok(Consultation {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        phone: row.get(4)?,
        height: row.get(5)?,
        weight: row.get(6)?,
        bmi: row.get(7)?,
        bmi_status,
        complaints: row.get(9)?,
        has_general_exam: row.get(10)?,
        has_lab_tests: row.get(11)?,
        has_ecg: row.get(12)?,
        has_x_ray: row.get(13)?,
        has_ultrasound: row.get(14)?,
        has_ct: row.get(15)?,
        has_mri: row.get(16)?,
        has_chronic_diseases: row.get(17)?,
        takes_medications: row.get(18)?,
        has_allergies: row.get(19)?,
        pain_level: row.get(20)?,
        additional_notes: row.get(21)?,
        created_at: row.get(22)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseLocation;
    use serde_json::json;

    fn test_repository() -> ConsultationRepository {
        ConsultationRepository::new(
            Arc::new(CoreConfig::in_memory()),
            Arc::new(Storage::in_memory()),
        )
    }

    fn form_submission() -> Value {
        json!({
            "patientName": "Ivan Petrenko",
            "age": "38",
            "gender": "male",
            "phone": "+380501234567",
            "height": "180",
            "weight": "85",
            "complaints": "Chest pain, shortness of breath on exertion",
            "hasGeneralExam": true,
            "hasEcg": true,
            "hasChronicDiseases": false,
            "painLevel": 3,
            "additionalNotes": ""
        })
    }

    #[test]
    fn derives_bmi_from_height_and_weight() {
        let repo = test_repository();
        let consultation = repo.create(&form_submission()).unwrap();

        assert_eq!(consultation.height, 180);
        assert_eq!(consultation.weight, 85);
        assert_eq!(consultation.bmi, Some(26.2));
        assert_eq!(consultation.bmi_status, Some(BmiStatus::Overweight));
        assert_eq!(consultation.age, 38);
        assert!(consultation.has_ecg);
        assert!(!consultation.has_mri);
        assert_eq!(consultation.additional_notes, None);
    }

    #[test]
    fn caller_supplied_bmi_is_ignored() {
        let repo = test_repository();
        let mut payload = form_submission();
        payload["bmi"] = json!(19.0);
        payload["bmiStatus"] = json!("Normal");

        let consultation = repo.create(&payload).unwrap();
        assert_eq!(consultation.bmi, Some(26.2));
        assert_eq!(consultation.bmi_status, Some(BmiStatus::Overweight));
    }

    #[test]
    fn empty_submission_defaults_everything() {
        let repo = test_repository();
        let consultation = repo.create(&json!({})).unwrap();

        assert_eq!(consultation.patient_name, "");
        assert_eq!(consultation.age, 0);
        assert_eq!(consultation.height, 0);
        assert_eq!(consultation.pain_level, 0);
        assert_eq!(consultation.bmi, None, "classifier is not invoked for zero height");
        assert_eq!(consultation.bmi_status, None);
        assert!(!consultation.has_general_exam);
    }

    #[test]
    fn unreadable_numbers_default_to_zero() {
        let repo = test_repository();
        let mut payload = form_submission();
        payload["age"] = json!("thirty");
        payload["weight"] = json!(null);

        let consultation = repo.create(&payload).unwrap();
        assert_eq!(consultation.age, 0);
        assert_eq!(consultation.weight, 0);
        assert_eq!(consultation.bmi, None);
    }

    #[test]
    fn pain_level_is_clamped() {
        let repo = test_repository();
        let mut payload = form_submission();
        payload["painLevel"] = json!("15");
        assert_eq!(repo.create(&payload).unwrap().pain_level, 10);

        payload["painLevel"] = json!(-2);
        assert_eq!(repo.create(&payload).unwrap().pain_level, 0);
    }

    #[test]
    fn form_checkbox_strings_are_flags() {
        let repo = test_repository();
        let mut payload = form_submission();
        payload["hasXRay"] = json!("on");
        payload["hasCt"] = json!("false");

        let consultation = repo.create(&payload).unwrap();
        assert!(consultation.has_x_ray);
        assert!(!consultation.has_ct);
    }

    #[test]
    fn list_round_trips_and_orders_newest_first() {
        let repo = test_repository();
        let first = repo.create(&form_submission()).unwrap();
        let second = repo.create(&json!({ "patientName": "Olena", "height": 165, "weight": 48 })).unwrap();

        let listed = repo.list_all().unwrap();
        assert_eq!(listed, vec![second.clone(), first]);
        assert_eq!(listed[0].bmi_status, Some(BmiStatus::Underweight));
    }

    #[test]
    fn configured_required_fields_gate_creation() {
        let cfg = CoreConfig::new(
            DatabaseLocation::InMemory,
            vec![],
            vec!["patientName".into(), "height".into()],
        )
        .unwrap();
        let repo = ConsultationRepository::new(Arc::new(cfg), Arc::new(Storage::in_memory()));

        let err = repo.create(&json!({ "weight": "80" })).unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Validation(ref v) if v.missing == vec!["patientName", "height"]
        ));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let repo = test_repository();
        let err = repo.create(&json!("hello")).unwrap_err();
        assert!(err.is_client_error());
    }
}
