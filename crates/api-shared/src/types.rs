//! Wire types for the intake API.
//!
//! These are the JSON shapes returned by the REST endpoints and consumed by the admin
//! dashboard. Keys are camelCase to match the intake forms.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error payload returned by every failing endpoint.
///
/// `missing_fields` is only populated for required-field rejections and `field` only for
/// a single malformed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRes {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            missing_fields: Vec::new(),
            field: None,
        }
    }
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// "Last First Middle", the way the registration desk reads names back.
    pub fn display_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.last_name, self.first_name, middle),
            None => format!("{} {}", self.last_name, self.first_name),
        }
    }
}

/// Body-mass-index category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BmiStatus {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiStatus {
    pub fn label(self) -> &'static str {
        match self {
            BmiStatus::Underweight => "Underweight",
            BmiStatus::Normal => "Normal",
            BmiStatus::Overweight => "Overweight",
            BmiStatus::Obese => "Obese",
        }
    }
}

impl std::fmt::Display for BmiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for BmiStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Underweight" => Ok(BmiStatus::Underweight),
            "Normal" => Ok(BmiStatus::Normal),
            "Overweight" => Ok(BmiStatus::Overweight),
            "Obese" => Ok(BmiStatus::Obese),
            other => Err(format!("unknown BMI status: {other}")),
        }
    }
}

/// A recorded medical consultation.
///
/// `patient_name` is free text and deliberately not linked to [`Patient`].
/// `bmi` and `bmi_status` are `None` when height or weight was not positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: i64,
    pub patient_name: String,
    pub age: i64,
    pub gender: String,
    pub phone: Option<String>,
    pub height: i64,
    pub weight: i64,
    pub bmi: Option<f64>,
    pub bmi_status: Option<BmiStatus>,
    pub complaints: Option<String>,
    pub has_general_exam: bool,
    pub has_lab_tests: bool,
    pub has_ecg: bool,
    pub has_x_ray: bool,
    pub has_ultrasound: bool,
    pub has_ct: bool,
    pub has_mri: bool,
    pub has_chronic_diseases: bool,
    pub takes_medications: bool,
    pub has_allergies: bool,
    pub pain_level: u8,
    pub additional_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Consultation {
    /// Short names of the examinations ordered for this consultation.
    pub fn ordered_exams(&self) -> Vec<&'static str> {
        [
            (self.has_general_exam, "exam"),
            (self.has_lab_tests, "labs"),
            (self.has_ecg, "ECG"),
            (self.has_x_ray, "X-ray"),
            (self.has_ultrasound, "US"),
            (self.has_ct, "CT"),
            (self.has_mri, "MRI"),
        ]
        .into_iter()
        .filter_map(|(ordered, name)| ordered.then_some(name))
        .collect()
    }
}

/// Body of the patient registration form.
///
/// Every field is optional at the schema level: the server reports all missing required
/// fields in a single response instead of failing on the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientSubmission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
}

/// Body of the consultation form.
///
/// Numeric fields are sent as strings by the form; JSON numbers are accepted too, and
/// only the leading integer is read. Flags accept booleans, the strings `"true"`,
/// `"on"`, `"yes"` and `"1"` in any case, and non-zero numbers. Unreadable numbers
/// count as 0 and unreadable flags as false.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationSubmission {
    pub patient_name: Option<String>,
    /// Years. String or number, e.g. `"40"` or `40`.
    pub age: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    /// Centimetres. String or number, e.g. `"180"` or `180`.
    pub height: Option<String>,
    /// Kilograms. String or number, e.g. `"85"` or `85`.
    pub weight: Option<String>,
    pub complaints: Option<String>,
    /// Boolean, a checkbox value (`"on"`, `"true"`, `"yes"`, `"1"`) or a number.
    pub has_general_exam: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub has_lab_tests: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub has_ecg: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub has_x_ray: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub has_ultrasound: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub has_ct: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub has_mri: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub has_chronic_diseases: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub takes_medications: Option<bool>,
    /// Same encoding as `hasGeneralExam`.
    pub has_allergies: Option<bool>,
    /// 0 to 10, clamped. String or number.
    pub pain_level: Option<String>,
    pub additional_notes: Option<String>,
}
