use std::fmt;

use ::time::format_description::BorrowedFormatItem;
use ::time::macros::format_description;
use ::time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Wall-clock instant parsed from a record timestamp.
///
/// Offsets in RFC 3339 inputs are normalised to UTC; all other accepted forms
/// are taken as-is. Ordering is chronological.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(PrimitiveDateTime);

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATE_TIME_T: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DATE_TIME_SPACE: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
// 01/31/2020 11:45:00 PM
const US_DATE_TIME_12H: &[BorrowedFormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute]:[second] [period]"
);
const US_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month padding:none]/[day padding:none]/[year]");

impl Timestamp {
    pub fn from_date(date: Date) -> Self {
        Self(PrimitiveDateTime::new(date, Time::MIDNIGHT))
    }

    /// Parses any of the supported timestamp layouts; `None` when none match.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(t) = OffsetDateTime::parse(raw, &::time::format_description::well_known::Rfc3339)
        {
            let utc = t.to_offset(::time::UtcOffset::UTC);
            return Some(Self(PrimitiveDateTime::new(utc.date(), utc.time())));
        }
        for layout in [DATE_TIME_T, DATE_TIME_SPACE, US_DATE_TIME_12H] {
            if let Ok(t) = PrimitiveDateTime::parse(raw, layout) {
                return Some(Self(t));
            }
        }
        for layout in [DATE, US_DATE] {
            if let Ok(d) = Date::parse(raw, layout) {
                return Some(Self::from_date(d));
            }
        }
        None
    }

    pub fn date(&self) -> Date {
        self.0.date()
    }

    /// Seconds since the Unix epoch, treating the wall-clock value as UTC.
    pub fn unix_seconds(&self) -> f64 {
        let t = self.0.assume_utc();
        t.unix_timestamp() as f64 + f64::from(t.nanosecond()) * 1e-9
    }

    pub fn from_unix_seconds(seconds: f64) -> Option<Self> {
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round() as i128;
        let t = OffsetDateTime::from_unix_timestamp_nanos(whole as i128 * 1_000_000_000 + nanos)
            .ok()?;
        Some(Self(PrimitiveDateTime::new(t.date(), t.time())))
    }

    pub fn start_of_day(&self) -> Self {
        Self::from_date(self.0.date())
    }

    pub fn start_of_month(&self) -> Self {
        let d = self.0.date();
        // Day 1 exists in every month.
        Self::from_date(Date::from_calendar_date(d.year(), d.month(), 1).unwrap_or(d))
    }

    pub fn month(&self) -> Month {
        self.0.month()
    }

    /// `YYYY-MM-DD`.
    pub fn date_key(&self) -> String {
        self.0.date().format(DATE).unwrap_or_default()
    }

    /// `YYYY-MM-DD` at midnight, `YYYY-MM-DD HH:MM:SS` otherwise.
    pub fn label(&self) -> String {
        if self.0.time() == Time::MIDNIGHT {
            self.date_key()
        } else {
            self.0.format(DATE_TIME_SPACE).unwrap_or_default()
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
