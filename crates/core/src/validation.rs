//! Required-field validation for intake submissions.
//!
//! Validation is pure: it inspects a JSON payload and reports every required field that
//! is absent, `null`, or a blank string. Which fields are required is configurable per
//! entity through [`RequiredFields`].

use crate::constants::{CONSULTATION_FIELDS, PATIENT_FIELDS, PATIENT_REQUIRED_FIELDS};
use crate::error::{IntakeError, IntakeResult, ValidationError};
use serde_json::{Map, Value};

/// Entity kinds accepted by the intake API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Patient,
    Consultation,
}

impl Entity {
    /// Every field name a payload for this entity may carry.
    pub fn known_fields(self) -> &'static [&'static str] {
        match self {
            Entity::Patient => PATIENT_FIELDS,
            Entity::Consultation => CONSULTATION_FIELDS,
        }
    }

    /// Fields that are required regardless of configuration.
    pub fn baseline_required(self) -> &'static [&'static str] {
        match self {
            Entity::Patient => PATIENT_REQUIRED_FIELDS,
            Entity::Consultation => &[],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Entity::Patient => "patient",
            Entity::Consultation => "consultation",
        }
    }
}

/// The set of fields a submission must carry before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
    entity: Entity,
    fields: Vec<String>,
}

impl RequiredFields {
    /// The baseline set for `entity` with no extra fields.
    pub fn baseline(entity: Entity) -> Self {
        Self {
            entity,
            fields: entity
                .baseline_required()
                .iter()
                .map(|f| (*f).to_string())
                .collect(),
        }
    }

    /// The baseline set for `entity` extended with `extra` field names.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidConfig` if any extra field is not a known field of the
    /// entity.
    pub fn with_extra<I, S>(entity: Entity, extra: I) -> IntakeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut required = Self::baseline(entity);
        for field in extra {
            let field = field.as_ref().trim();
            if field.is_empty() {
                continue;
            }
            if !entity.known_fields().contains(&field) {
                return Err(IntakeError::InvalidConfig(format!(
                    "unknown {} field in required set: {field}",
                    entity.name()
                )));
            }
            if !required.fields.iter().any(|f| f == field) {
                required.fields.push(field.to_string());
            }
        }
        Ok(required)
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Checks `payload` against the required set.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming every missing field, in the order of the
    /// required set.
    pub fn check(&self, payload: &Map<String, Value>) -> Result<(), ValidationError> {
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|field| !is_present(payload.get(field.as_str())))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(missing))
        }
    }

    /// Validates a raw request body and returns it as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidField` if the body is not a JSON object, or
    /// `IntakeError::Validation` if required fields are missing.
    pub fn validate<'a>(&self, payload: &'a Value) -> IntakeResult<&'a Map<String, Value>> {
        let object = payload.as_object().ok_or_else(|| IntakeError::InvalidField {
            field: "body".into(),
            reason: format!("{} payload must be a JSON object", self.entity.name()),
        })?;
        self.check(object)?;
        Ok(object)
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
