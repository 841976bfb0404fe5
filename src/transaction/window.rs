//! Calendar-month date windows for filtering and summarising transactions.

use time::{Date, Month, OffsetDateTime, UtcOffset, util};

/// An inclusive range of instants, from the first to the last instant of a
/// calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// The first instant in the window.
    pub start: OffsetDateTime,
    /// The last instant in the window.
    pub end: OffsetDateTime,
}

impl DateWindow {
    /// Whether `date_time` falls within the window, bounds included.
    pub fn contains(&self, date_time: OffsetDateTime) -> bool {
        self.start <= date_time && date_time <= self.end
    }
}

/// Resolve an optional month and year into a window.
///
/// Both must be given for the result to be bounded, otherwise `None` means
/// "no bound". The month is typed so callers reject out-of-range integers
/// (e.g. 13) when they convert their input.
pub fn resolve_window(
    month: Option<Month>,
    year: Option<i32>,
    local_offset: UtcOffset,
) -> Option<DateWindow> {
    match (month, year) {
        (Some(month), Some(year)) => month_window(year, month, local_offset),
        _ => None,
    }
}

/// The window covering `month` of `year` in `local_offset`.
///
/// Returns `None` if `year` is outside the range supported by [time].
pub fn month_window(year: i32, month: Month, local_offset: UtcOffset) -> Option<DateWindow> {
    let first_day = Date::from_calendar_date(year, month, 1).ok()?;
    let last_day =
        Date::from_calendar_date(year, month, util::days_in_year_month(year, month)).ok()?;

    let start = first_day.midnight().assume_offset(local_offset);
    let end = last_day
        .with_hms_nano(23, 59, 59, 999_999_999)
        .ok()?
        .assume_offset(local_offset);

    Some(DateWindow { start, end })
}
