//! Date and time stamps in the fixed textual formats used by log lines and
//! generated file names.

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

type Format = &'static [BorrowedFormatItem<'static>];

const DATE: Format = format_description!("[year]-[month]-[day]");
const DATE_COMPACT: Format = format_description!("[year][month][day]");
const TIME: Format = format_description!("[hour]:[minute]:[second]");
const TIME_COMPACT: Format = format_description!("[hour][minute][second]");
const TIME_MILLIS: Format = format_description!("[hour]:[minute]:[second].[subsecond digits:3]");
const TIME_COMPACT_MILLIS: Format =
    format_description!("[hour][minute][second].[subsecond digits:3]");

/// Current wall-clock time, in the local offset when it can be determined.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Current date as `YYYY-MM-DD`, or `YYYYMMDD` without separators.
pub fn date_stamp(use_separator: bool) -> String {
    format_date(&now(), use_separator)
}

/// Current time as `HH:MM:SS[.mmm]`, or `HHMMSS[.mmm]` without separators.
pub fn time_stamp(use_separator: bool, use_millis: bool) -> String {
    format_time(&now(), use_separator, use_millis)
}

/// Current date and time with milliseconds, e.g. `2026-01-15 13:45:07.042`.
pub fn full_timestamp(use_separator: bool) -> String {
    format_full(&now(), use_separator)
}

// Descriptions above only use components every `OffsetDateTime` carries.
fn render(at: &OffsetDateTime, format: Format) -> String {
    at.format(format).unwrap_or_default()
}

pub fn format_date(at: &OffsetDateTime, use_separator: bool) -> String {
    render(at, if use_separator { DATE } else { DATE_COMPACT })
}

pub fn format_time(at: &OffsetDateTime, use_separator: bool, use_millis: bool) -> String {
    let format = match (use_separator, use_millis) {
        (true, true) => TIME_MILLIS,
        (true, false) => TIME,
        (false, true) => TIME_COMPACT_MILLIS,
        (false, false) => TIME_COMPACT,
    };
    render(at, format)
}

pub fn format_full(at: &OffsetDateTime, use_separator: bool) -> String {
    format!(
        "{} {}",
        format_date(at, use_separator),
        format_time(at, use_separator, true)
    )
}
