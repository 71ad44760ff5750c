//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services,
//! so request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_DATABASE_PATH, IN_MEMORY_DATABASE};
use crate::validation::{Entity, RequiredFields};
use crate::IntakeResult;
use std::path::{Path, PathBuf};

/// Where the SQLite database lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    InMemory,
}

impl DatabaseLocation {
    /// Interprets a configured path, treating `:memory:` as an in-memory database.
    pub fn from_path_value(value: &str) -> Self {
        let value = value.trim();
        if value == IN_MEMORY_DATABASE {
            DatabaseLocation::InMemory
        } else {
            DatabaseLocation::File(PathBuf::from(value))
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DatabaseLocation::File(path) => Some(path),
            DatabaseLocation::InMemory => None,
        }
    }
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseLocation::File(path) => write!(f, "{}", path.display()),
            DatabaseLocation::InMemory => f.write_str(IN_MEMORY_DATABASE),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database: DatabaseLocation,
    patient_required: RequiredFields,
    consultation_required: RequiredFields,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `patient_extra` and `consultation_extra` name fields required on top of each
    /// entity's baseline.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidConfig` if an extra field name is not a known field
    /// of its entity.
    pub fn new(
        database: DatabaseLocation,
        patient_extra: Vec<String>,
        consultation_extra: Vec<String>,
    ) -> IntakeResult<Self> {
        Ok(Self {
            database,
            patient_required: RequiredFields::with_extra(Entity::Patient, patient_extra)?,
            consultation_required: RequiredFields::with_extra(
                Entity::Consultation,
                consultation_extra,
            )?,
        })
    }

    /// In-memory database with baseline required fields. Used by tests and tooling.
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseLocation::InMemory,
            patient_required: RequiredFields::baseline(Entity::Patient),
            consultation_required: RequiredFields::baseline(Entity::Consultation),
        }
    }

    pub fn database(&self) -> &DatabaseLocation {
        &self.database
    }

    pub fn required_fields(&self, entity: Entity) -> &RequiredFields {
        match entity {
            Entity::Patient => &self.patient_required,
            Entity::Consultation => &self.consultation_required,
        }
    }
}

/// Resolve the database location from an optional string value.
///
/// `None` and blank values fall back to [`DEFAULT_DATABASE_PATH`].
pub fn database_location_from_env_value(value: Option<String>) -> DatabaseLocation {
    match value {
        Some(v) if !v.trim().is_empty() => DatabaseLocation::from_path_value(&v),
        _ => DatabaseLocation::File(PathBuf::from(DEFAULT_DATABASE_PATH)),
    }
}

/// Parse a comma-separated list of field names from an optional string value.
///
/// `None`, empty and whitespace-only values yield an empty list.
pub fn field_list_from_env_value(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
