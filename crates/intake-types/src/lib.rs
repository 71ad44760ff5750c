//! Small validated value types shared by the intake crates.

use std::fmt;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("value is blank")]
    Blank,
}

/// Text that is known to hold at least one non-whitespace character.
///
/// Surrounding whitespace is stripped on construction. Required patient fields are held
/// in this form between parsing and insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// # Errors
    ///
    /// Returns `TextError::Blank` when nothing is left after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TextError> {
        match raw.as_ref().trim() {
            "" => Err(TextError::Blank),
            text => Ok(Self(text.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Self-reported pain on the 0 to 10 scale used by the consultation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PainLevel(u8);

impl PainLevel {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 10;

    /// Builds a pain level, clamping out-of-range input onto the scale.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PainLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}
