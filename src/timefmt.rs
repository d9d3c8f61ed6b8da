//! Date/time formats shared by the JSON API, multipart forms and exports.

use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::errors::ValidationError;

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

pub fn date(ts: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day()
    )
}

pub fn clock(ts: OffsetDateTime) -> String {
    format!("{:02}:{:02}:{:02}", ts.hour(), ts.minute(), ts.second())
}

pub fn minute(ts: OffsetDateTime) -> String {
    format!("{} {:02}:{:02}", date(ts), ts.hour(), ts.minute())
}

/// Accepts RFC 3339 or the `YYYY-MM-DDTHH:MM[:SS]` shape of an HTML
/// `datetime-local` input, the latter taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, ValidationError> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    PrimitiveDateTime::parse(raw, with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(raw, without_seconds))
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| ValidationError::InvalidTimestamp(raw.to_string()))
}
