//! Wire timestamp codec.
//!
//! The API exchanges every time field as `YYYY-MM-DDTHH:MM:SSZ`: UTC, second
//! precision, no fractional part. Use `#[serde(with = "crate::timestamp")]`
//! on `DateTime<Utc>` fields and `#[serde(default, with =
//! "crate::timestamp::option")]` on optional ones.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use thiserror::Error;

/// `strftime` layout of the wire format.
pub const LAYOUT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Raised when a string is not a wire timestamp.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid timestamp '{input}': {message}")]
pub struct TimestampError {
    /// Rejected input.
    pub input: String,
    /// Parser diagnostic.
    pub message: String,
}

/// Parses a wire timestamp.
///
/// # Errors
///
/// Returns [`TimestampError`] when `input` does not match [`LAYOUT`] exactly.
pub fn parse(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    NaiveDateTime::parse_from_str(input, LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|err| TimestampError {
            input: input.to_owned(),
            message: err.to_string(),
        })
}

/// Formats a timestamp in the wire layout, truncating sub-second precision.
#[must_use]
pub fn format(value: &DateTime<Utc>) -> String {
    value.format(LAYOUT).to_string()
}

/// Serde serializer for `DateTime<Utc>` fields.
///
/// # Errors
///
/// Propagates serializer failures.
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(value))
}

/// Serde deserializer for `DateTime<Utc>` fields.
///
/// # Errors
///
/// Fails when the value is not a string in the wire layout.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

/// Serde helpers for optional timestamps. `null` and empty strings decode to
/// `None`; `None` serializes as `null`.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional timestamp.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => super::serialize(inner, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional timestamp.
    ///
    /// # Errors
    ///
    /// Fails when a non-empty value is not in the wire layout.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(text) => super::parse(text)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
