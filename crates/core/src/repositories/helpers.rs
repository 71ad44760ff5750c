//! Field parsing shared by the repositories.
//!
//! Intake forms submit most values as strings. These helpers turn raw JSON values into
//! typed fields and are wired into the submission structs with `deserialize_with`.
//! The consultation helpers are lenient and never fail; the patient helpers reject values
//! that cannot be read as text or as a date.

use chrono::{DateTime, NaiveDate};
use intake_types::NonEmptyText;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads the leading integer of a value the way form fields are usually parsed.
///
/// `180`, `"180"`, `" 180cm"` and `"180.7"` all give 180. Anything without a leading
/// integer (missing, `null`, `"abc"`, booleans) gives 0.
pub(crate) fn int_prefix(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => parse_int_prefix(s),
        _ => 0,
    }
}

fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(0);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Reads a checkbox-style flag. Booleans pass through; `"true"`, `"on"`, `"yes"` and
/// `"1"` (any case) and non-zero numbers are true; everything else is false.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "yes" | "1"
        ),
        _ => false,
    }
}

/// Reads free text. Blank strings and `null` are absent; numbers and booleans are
/// rendered as text.
pub(crate) fn text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err("expected text".into()),
    }
}

/// Parses a date of birth given as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub(crate) fn parse_birth_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| format!("expected a date as YYYY-MM-DD, got {raw:?}"))
}

pub(crate) fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(int_prefix(&Value::deserialize(deserializer)?))
}

pub(crate) fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(truthy(&Value::deserialize(deserializer)?))
}

/// Free text that falls back to an empty string instead of failing.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text(&Value::deserialize(deserializer)?)
        .ok()
        .flatten()
        .unwrap_or_default())
}

/// Optional free text that falls back to absent instead of failing.
pub(crate) fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text(&Value::deserialize(deserializer)?).ok().flatten())
}

pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    text(&Value::deserialize(deserializer)?).map_err(D::Error::custom)
}

pub(crate) fn required_text<'de, D>(deserializer: D) -> Result<NonEmptyText, D::Error>
where
    D: Deserializer<'de>,
{
    let value = text(&Value::deserialize(deserializer)?)
        .map_err(D::Error::custom)?
        .ok_or_else(|| D::Error::custom("value is required"))?;
    NonEmptyText::new(value).map_err(D::Error::custom)
}

pub(crate) fn birth_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = text(&Value::deserialize(deserializer)?)
        .map_err(D::Error::custom)?
        .ok_or_else(|| D::Error::custom("value is required"))?;
    parse_birth_date(&raw).map_err(D::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_prefix_reads_leading_integer() {
        assert_eq!(int_prefix(&json!(180)), 180);
        assert_eq!(int_prefix(&json!("180")), 180);
        assert_eq!(int_prefix(&json!(" 85kg")), 85);
        assert_eq!(int_prefix(&json!("180.7")), 180);
        assert_eq!(int_prefix(&json!(72.9)), 72);
        assert_eq!(int_prefix(&json!("-4")), -4);
    }

    #[test]
    fn int_prefix_defaults_to_zero() {
        assert_eq!(int_prefix(&Value::Null), 0);
        assert_eq!(int_prefix(&json!("")), 0);
        assert_eq!(int_prefix(&json!("abc")), 0);
        assert_eq!(int_prefix(&json!("-")), 0);
        assert_eq!(int_prefix(&json!(true)), 0);
        assert_eq!(int_prefix(&json!([1])), 0);
    }

    #[test]
    fn truthy_follows_form_conventions() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("on")));
        assert!(truthy(&json!("TRUE")));
        assert!(truthy(&json!(1)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!("off")));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&Value::Null));
    }

    #[test]
    fn text_treats_blank_as_absent() {
        assert_eq!(text(&json!("  ")).unwrap(), None);
        assert_eq!(text(&Value::Null).unwrap(), None);
        assert_eq!(text(&json!(" Kyiv ")).unwrap(), Some("Kyiv".into()));
        assert_eq!(text(&json!(380501234567i64)).unwrap(), Some("380501234567".into()));
        assert!(text(&json!({ "a": 1 })).is_err());
    }

    #[test]
    fn birth_date_accepts_date_and_timestamp() {
        assert_eq!(
            parse_birth_date("1985-05-15").unwrap(),
            NaiveDate::from_ymd_opt(1985, 5, 15).unwrap()
        );
        assert_eq!(
            parse_birth_date("1985-05-15T00:00:00.000Z").unwrap(),
            NaiveDate::from_ymd_opt(1985, 5, 15).unwrap()
        );
        assert!(parse_birth_date("15/05/1985").is_err());
        assert!(parse_birth_date("1985-02-30").is_err());
    }
}
