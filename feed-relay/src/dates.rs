//! Timestamp normalization across RSS dialects.
//!
//! Every date the pipeline compares goes through [`parse`], so RFC-2822
//! `pubDate` values, ISO-8601 Dublin-Core/Atom values and bare dates from the
//! tracker document all end up as UTC instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::types::{RelayError, Result};

pub type CanonicalTimestamp = DateTime<Utc>;

const RFC2822_NUMERIC: &str = "%a, %d %b %Y %H:%M:%S %z";
const RFC2822_NAIVE: &str = "%a, %d %b %Y %H:%M:%S";
const ISO_UTC: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ"];
// No offset at all, with a `T` or a space between date and time.
const ISO_NAIVE: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];
const DATE_ONLY: &str = "%Y-%m-%d";

/// Parse a raw timestamp into a UTC instant. Values without an offset are
/// taken as UTC; date-only values are midnight UTC.
pub fn parse(raw: &str) -> Result<CanonicalTimestamp> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(date_error(raw));
    }

    if let Some(parsed) = parse_rfc2822(value) {
        return Ok(parsed);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ISO_UTC.iter().chain(ISO_NAIVE.iter()) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_ONLY) {
        return Ok(midnight(date));
    }

    Err(date_error(raw))
}

/// The part of an entry's raw date used for watermark comparison: an ISO
/// timestamp is cut to its `YYYY-MM-DD` prefix, anything else is used whole.
pub fn comparison_date(raw: &str) -> &str {
    let value = raw.trim();
    let bytes = value.as_bytes();
    if bytes.len() > 10 && bytes[10] == b'T' && NaiveDate::parse_from_str(&value[..10], DATE_ONLY).is_ok() {
        &value[..10]
    } else {
        value
    }
}

/// [`comparison_date`] followed by [`parse`].
pub fn normalize_entry_date(raw: &str) -> Result<CanonicalTimestamp> {
    parse(comparison_date(raw))
}

fn parse_rfc2822(value: &str) -> Option<CanonicalTimestamp> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, RFC2822_NUMERIC) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, RFC2822_NAIVE) {
        return Some(Utc.from_utc_datetime(&naive));
    }

    // A zone name chrono does not know ("UTC", "Z") is read as UTC.
    if let Some((head, zone)) = value.rsplit_once(' ') {
        if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()) {
            if let Ok(naive) = NaiveDateTime::parse_from_str(head, RFC2822_NAIVE) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
    }

    // Feeds sometimes carry a weekday that does not match the date.
    if let Some((weekday, rest)) = value.split_once(", ") {
        if weekday.len() == 3 && weekday.chars().all(|c| c.is_ascii_alphabetic()) {
            if let Ok(parsed) = DateTime::parse_from_rfc2822(rest) {
                return Some(parsed.with_timezone(&Utc));
            }
        }
    }

    None
}

fn midnight(date: NaiveDate) -> CanonicalTimestamp {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

fn date_error(raw: &str) -> RelayError {
    RelayError::DateParse { raw: raw.to_string() }
}

/// Watermarks at exactly midnight are written as bare dates, the form the
/// tracker document has always used; anything else as RFC-3339.
pub fn format_watermark(value: &CanonicalTimestamp) -> String {
    if *value == midnight(value.date_naive()) {
        value.format(DATE_ONLY).to_string()
    } else {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// Serde adapter: written as RFC-3339 UTC, read through [`parse`].
pub mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional watermarks, see [`format_watermark`].
pub mod watermark {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&super::format_watermark(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse(&raw).map(Some).map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
