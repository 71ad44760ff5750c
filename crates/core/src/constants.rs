//! Constants used throughout the clinic core crate.

/// Default SQLite database file when no explicit path is configured.
pub const DEFAULT_DATABASE_PATH: &str = "clinic.db";

/// Database path value that selects an in-memory database.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Table holding registered patients.
pub const PATIENTS_TABLE: &str = "patients";

/// Table holding recorded consultations.
pub const CONSULTATIONS_TABLE: &str = "consultations";

/// Fields a patient submission must always carry.
pub const PATIENT_REQUIRED_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "dateOfBirth",
    "gender",
    "phone",
    "address",
    "city",
];

/// Every field a patient submission may carry.
pub const PATIENT_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "middleName",
    "dateOfBirth",
    "gender",
    "phone",
    "email",
    "address",
    "city",
    "postalCode",
    "emergencyContact",
    "emergencyPhone",
    "medicalHistory",
    "allergies",
    "medications",
];

/// Every field a consultation submission may carry.
pub const CONSULTATION_FIELDS: &[&str] = &[
    "patientName",
    "age",
    "gender",
    "phone",
    "height",
    "weight",
    "complaints",
    "hasGeneralExam",
    "hasLabTests",
    "hasEcg",
    "hasXRay",
    "hasUltrasound",
    "hasCt",
    "hasMri",
    "hasChronicDiseases",
    "takesMedications",
    "hasAllergies",
    "painLevel",
    "additionalNotes",
];
