//! Pure normalization and validation helpers shared by the entity constructors.
//!
//! Nothing here touches the store, so the same checks apply to directly built
//! values, imported records and models read back from the database.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::strum::IntoEnumIterator;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{RosterError, RosterResult};

/// Lowercases and trims an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims an optional string, mapping blank values to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fails with a message naming every `(field, value)` pair whose value is blank.
pub fn require_fields(fields: &[(&str, &str)]) -> RosterResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RosterError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Parses `value` into one of the variants of a closed enum.
///
/// The error lists the accepted values, e.g.
/// `status must be one of: active, inactive, dropped`.
pub fn parse_choice<E>(field: &str, value: &str) -> RosterResult<E>
where
    E: FromStr + IntoEnumIterator + Display,
{
    E::from_str(value.trim()).map_err(|_| {
        let valid: Vec<String> = E::iter().map(|v| v.to_string()).collect();
        RosterError::Validation(format!(
            "{} must be one of: {}",
            field,
            valid.join(", ")
        ))
    })
}

/// Parses an ISO-8601 style timestamp. Unparseable input yields `None`.
///
/// Accepts RFC 3339, naive date-times (assumed UTC) with `T` or space as the
/// separator, and bare dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
