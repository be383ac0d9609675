use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::num::ParseIntError;
use thiserror::Error;
use tracing::warn;

use crate::error::RowError;

/// Hour marker used by French-style times such as `14h30`.
const HOUR_MARKER: char = 'h';

#[derive(Error, Debug, PartialEq)]
pub enum TimeParseError {
    #[error("expected H:MM, got `{0}`")]
    Malformed(String),

    #[error("`{component}` is not a number: {source}")]
    NotANumber {
        component: String,
        source: ParseIntError,
    },

    #[error("{hour}:{minute:02} is not a valid time of day")]
    OutOfRange { hour: u32, minute: u32 },
}

/// Parse `"DD/MM/YYYY"` into a calendar date. Day and month may be a single
/// digit; the year must be exactly four.
pub fn parse_day_date(raw: &str) -> Result<NaiveDate, RowError> {
    let s = raw.trim();
    let invalid = || RowError::InvalidDate { raw: s.to_string() };

    let year = s.rsplit('/').next().ok_or_else(invalid)?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y").map_err(|_| invalid())
}

/// Midnight of `date`.
pub fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Combine `date` with a loosely formatted time of day.
///
/// Accepts `H:MM`, `HH:MM`, `14h30`, `14h`, `14:` and `H:MM:SS`. Seconds are
/// checked to be numeric and then dropped. A time that cannot be read is
/// logged and comes back as `None`; it never fails the row.
pub fn parse_time_on_date(date: NaiveDate, raw: &str) -> Option<NaiveDateTime> {
    match parse_time_of_day(raw) {
        Ok(time) => Some(date.and_time(time)),
        Err(e) => {
            warn!(raw, error = %e, "could not parse time of day");
            None
        }
    }
}

pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, TimeParseError> {
    let mut clean = raw.trim().to_lowercase().replace(HOUR_MARKER, ":");
    let hour_only = clean.ends_with(':') && clean.matches(':').count() == 1;
    if clean.matches(':').count() == 1 {
        clean.push_str(":00");
    }

    let mut parts = clean.split(':');
    let hour = number(parts.next())?;
    let minute = match parts.next() {
        Some("") if hour_only => 0,
        Some(m) => number(Some(m))?,
        None => return Err(TimeParseError::Malformed(raw.trim().to_string())),
    };
    // seconds and anything after must still be numbers
    for rest in parts {
        number(Some(rest))?;
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(TimeParseError::OutOfRange { hour, minute })
}

fn number(component: Option<&str>) -> Result<u32, TimeParseError> {
    // `14 h 30` is common French typography
    let component = component.unwrap_or_default().trim();
    component
        .parse::<u32>()
        .map_err(|source| TimeParseError::NotANumber {
            component: component.to_string(),
            source,
        })
}
