// src/transform/mod.rs
pub mod date_parser;

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::error::RowError;
use crate::source::SourceRow;
use date_parser::{at_midnight, parse_day_date, parse_time_on_date};

/// The payload posted for one day. Field order is the JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDateTime,
    pub open: Option<NaiveDateTime>,
    pub start: Option<NaiveDateTime>,
    pub close: Option<NaiveDateTime>,
    pub aers: Vec<String>,
    pub message: String,
    pub observations: String,
    /// Outer `None`: the source had no end, so the key is left out.
    /// `Some(None)`: there was an end but it did not parse, sent as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Option<NaiveDateTime>>,
}

/// Orderings the receiving service refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleIssue {
    OpenNotBeforeClose,
    StartNotBeforeClose,
    OpenAfterStart,
    EndBeforeStart,
}

impl fmt::Display for ScheduleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ScheduleIssue::OpenNotBeforeClose => "open time must be before close time",
            ScheduleIssue::StartNotBeforeClose => "guard start must be before close time",
            ScheduleIssue::OpenAfterStart => "guard start must be between open and close",
            ScheduleIssue::EndBeforeStart => "guard end must be after guard start",
        };
        f.write_str(msg)
    }
}

impl DayRecord {
    /// Check the times against each other. Only pairs where both sides parsed
    /// are compared.
    pub fn schedule_issues(&self) -> Vec<ScheduleIssue> {
        let mut issues = Vec::new();
        if let (Some(open), Some(close)) = (self.open, self.close) {
            if open >= close {
                issues.push(ScheduleIssue::OpenNotBeforeClose);
            }
        }
        if let (Some(start), Some(close)) = (self.start, self.close) {
            if start >= close {
                issues.push(ScheduleIssue::StartNotBeforeClose);
            }
        }
        if let (Some(open), Some(start)) = (self.open, self.start) {
            if open > start {
                issues.push(ScheduleIssue::OpenAfterStart);
            }
        }
        if let (Some(Some(end)), Some(start)) = (self.end, self.start) {
            if end < start {
                issues.push(ScheduleIssue::EndBeforeStart);
            }
        }
        issues
    }
}

/// Turn one source row into a day record.
///
/// Only a missing or malformed date (or a missing required column) fails the
/// row. Unreadable times become `None`.
pub fn transform_row(row: &SourceRow) -> Result<DayRecord, RowError> {
    let date_raw = row.required("date")?.ok_or(RowError::MissingDate)?;
    let date = parse_day_date(date_raw)?;

    let time = |column: &'static str| -> Result<Option<NaiveDateTime>, RowError> {
        match row.required(column)? {
            Some(raw) => Ok(parse_time_on_date(date, raw)),
            None => {
                warn!(column, "time cell is empty; sending null");
                Ok(None)
            }
        }
    };
    let open = time("open")?;
    let start = time("start")?;
    let close = time("close")?;

    let end = row
        .optional("end")
        .map(|raw| parse_time_on_date(date, raw));

    Ok(DayRecord {
        date: at_midnight(date),
        open,
        start,
        close,
        aers: row.optional("aers").map(split_aers).unwrap_or_default(),
        message: row.optional("message").unwrap_or_default().to_string(),
        observations: row.optional("observations").unwrap_or_default().to_string(),
        end,
    })
}

/// `"A1, A2,  A3,"` → `["A1", "A2", "A3"]`
fn split_aers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
