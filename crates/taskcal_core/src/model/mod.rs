mod group;
mod task;

pub use group::{Group, LEGACY_DEFAULT_GROUP_NAMES};
pub use task::{Priority, Task, TaskStatus};

use crate::error::AppError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Parses a calendar date from `YYYY-MM-DD` or an RFC3339 timestamp.
///
/// Timestamps keep the date they were written in; the time of day is dropped.
pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("date is required"));
    }

    if let Ok(date) = Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }

    OffsetDateTime::parse(trimmed, &Rfc3339)
        .map(|datetime| datetime.date())
        .map_err(|_| AppError::invalid_input(format!("invalid date '{trimmed}', use YYYY-MM-DD")))
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn now_rfc3339() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}
