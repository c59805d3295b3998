//! Parsing user-supplied publish times.

use crate::error::UploadError;
use jiff::tz::TimeZone;
use jiff::{Timestamp, civil};

/// Parses a publish time.
///
/// Accepts an RFC 3339 timestamp with an offset (`2024-01-15T10:30:00Z`,
/// `2024-01-15T10:30:00+02:00`) or a civil date-time without one (`2024-01-15T10:30:00`,
/// `2024-01-15 10:30`), which is read in the system time zone. Times in the past are accepted
/// with a warning.
pub fn parse_schedule_time(input: &str) -> Result<Timestamp, UploadError> {
    parse_in(input, &TimeZone::system(), Timestamp::now())
}

fn parse_in(input: &str, tz: &TimeZone, now: Timestamp) -> Result<Timestamp, UploadError> {
    let trimmed = input.trim();
    let at = match trimmed.parse::<Timestamp>() {
        Ok(at) => at,
        Err(_) => trimmed
            .parse::<civil::DateTime>()
            .and_then(|dt| dt.to_zoned(tz.clone()))
            .map(|zoned| zoned.timestamp())
            .map_err(|e| {
                tracing::debug!("rejecting schedule time {trimmed:?}: {e}");
                UploadError::InvalidScheduleTime(input.to_string())
            })?,
    };

    if at < now {
        tracing::warn!(scheduled_time = %at, "scheduled time is in the past");
    }
    Ok(at)
}
