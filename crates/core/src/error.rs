/// A rejected submission, naming every required field that was missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("required fields are missing: {}", missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<String>,
}

impl ValidationError {
    pub fn new(missing: Vec<String>) -> Self {
        Self { missing }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("storage handle has been closed")]
    StorageClosed,
    #[error("storage lock poisoned")]
    LockPoisoned,
}

impl IntakeError {
    /// Whether the caller caused this error (as opposed to the storage layer).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IntakeError::Validation(_) | IntakeError::InvalidField { .. }
        )
    }
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
