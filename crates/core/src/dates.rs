//! Shared date utilities: parsing backend timestamps, display formatting in
//! the viewer's offset, relative ages, and the date-range buckets used by
//! the incident filter.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::TimestampError;

wire_enum!(
    /// Quick date buckets offered by the search panel.
    DateRange, "date range" {
        Today => "today",
        Yesterday => "yesterday",
        Week => "week",
        Month => "month",
    }
);

impl DateRange {
    /// Whether `ts` falls in the bucket as seen from `now` in `offset`.
    ///
    /// `today` / `yesterday` are calendar days in the viewer's offset.
    /// `week` / `month` are rolling windows of 7 and 30 days ending at `now`.
    pub fn contains(self, ts: OffsetDateTime, now: OffsetDateTime, offset: UtcOffset) -> bool {
        let local_ts = ts.to_offset(offset).date();
        let local_today = now.to_offset(offset).date();
        let age = now - ts;
        match self {
            DateRange::Today => local_ts == local_today,
            DateRange::Yesterday => local_today.previous_day() == Some(local_ts),
            DateRange::Week => age >= Duration::ZERO && age <= Duration::days(7),
            DateRange::Month => age >= Duration::ZERO && age <= Duration::days(30),
        }
    }
}

/// Parse a backend timestamp. RFC 3339 is canonical; a naive
/// `YYYY-MM-DDTHH:MM:SS` (or `YYYY-MM-DD HH:MM:SS`) is read as UTC.
pub fn parse_timestamp(input: &str) -> Result<OffsetDateTime, TimestampError> {
    let trimmed = input.trim();
    if let Ok(ts) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(ts);
    }

    let naive_t = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let naive_space = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(trimmed, naive_t)
        .or_else(|_| PrimitiveDateTime::parse(trimmed, naive_space))
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| TimestampError::Invalid {
            input: input.to_string(),
            message: e.to_string(),
        })
}

/// Parse `+HH:MM`, `-HH:MM` or `Z`.
pub fn parse_offset(input: &str) -> Result<UtcOffset, TimestampError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        trimmed,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| TimestampError::Offset(input.to_string()))
}

/// `Jan 5, 2025`
pub fn format_date(ts: OffsetDateTime, offset: UtcOffset) -> String {
    ts.to_offset(offset)
        .format(format_description!(
            "[month repr:short] [day padding:none], [year]"
        ))
        .unwrap_or_else(|_| ts.date().to_string())
}

/// `Jan 5, 2025 14:03`
pub fn format_date_time(ts: OffsetDateTime, offset: UtcOffset) -> String {
    ts.to_offset(offset)
        .format(format_description!(
            "[month repr:short] [day padding:none], [year] [hour]:[minute]"
        ))
        .unwrap_or_else(|_| ts.to_string())
}

/// `14:03`
pub fn format_time(ts: OffsetDateTime, offset: UtcOffset) -> String {
    ts.to_offset(offset)
        .format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| ts.time().to_string())
}

/// Age of `ts` as the list views show it. Anything older than a week falls
/// back to the calendar date.
pub fn format_relative(ts: OffsetDateTime, now: OffsetDateTime, offset: UtcOffset) -> String {
    let age = now - ts;
    if age < Duration::minutes(1) {
        return "just now".to_string();
    }
    if age < Duration::hours(1) {
        return plural(age.whole_minutes(), "minute");
    }
    if age < Duration::days(1) {
        return plural(age.whole_hours(), "hour");
    }
    if age < Duration::days(2) {
        return "yesterday".to_string();
    }
    if age < Duration::days(7) {
        return plural(age.whole_days(), "day");
    }
    format_date(ts, offset)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
