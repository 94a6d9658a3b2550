use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// A date-scoped `[start_time, end_time)` slot. Construction guarantees
/// `start_time < end_time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl TimeWindow {
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self, DomainError> {
        if start_time >= end_time {
            return Err(DomainError::InvalidTimeWindow {
                start: start_time.format(TIME_FORMAT).to_string(),
                end: end_time.format(TIME_FORMAT).to_string(),
            });
        }

        Ok(Self { date, start_time, end_time })
    }

    pub fn parse(date: &str, start_time: &str, end_time: &str) -> Result<Self, DomainError> {
        Self::new(parse_date(date)?, parse_time(start_time)?, parse_time(end_time)?)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    pub fn formatted_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn formatted_start_time(&self) -> String {
        self.start_time.format(TIME_FORMAT).to_string()
    }

    pub fn formatted_end_time(&self) -> String {
        self.end_time.format(TIME_FORMAT).to_string()
    }

    /// Half-open overlap: back-to-back windows do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.formatted_date(),
            self.formatted_start_time(),
            self.formatted_end_time()
        )
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| DomainError::InvalidDate(value.trim().to_owned()))
}

/// Accepts `HH:MM` and the `HH:MM:SS` form some clients send.
pub fn parse_time(value: &str) -> Result<NaiveTime, DomainError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| DomainError::InvalidTimeFormat(trimmed.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::{parse_time, TimeWindow};
    use crate::errors::DomainError;

    fn window(start: &str, end: &str) -> TimeWindow {
        TimeWindow::parse("2026-10-16", start, end).expect("valid window")
    }

    #[test]
    fn rejects_zero_length_and_inverted_windows() {
        assert!(matches!(
            TimeWindow::parse("2026-10-16", "10:00", "10:00"),
            Err(DomainError::InvalidTimeWindow { .. })
        ));
        assert!(matches!(
            TimeWindow::parse("2026-10-16", "11:00", "10:00"),
            Err(DomainError::InvalidTimeWindow { .. })
        ));
    }

    #[test]
    fn formats_with_fixed_display_patterns() {
        let window = window("09:05", "10:30");
        assert_eq!(window.formatted_date(), "2026-10-16");
        assert_eq!(window.formatted_start_time(), "09:05");
        assert_eq!(window.formatted_end_time(), "10:30");
        assert_eq!(window.to_string(), "2026-10-16 09:05-10:30");
    }

    #[test]
    fn back_to_back_windows_do_not_overlap() {
        assert!(!window("09:00", "10:00").overlaps(&window("10:00", "11:00")));
        assert!(!window("10:00", "11:00").overlaps(&window("09:00", "10:00")));
    }

    #[test]
    fn shared_start_overlaps() {
        assert!(window("09:00", "09:30").overlaps(&window("09:00", "10:00")));
    }

    #[test]
    fn different_dates_never_overlap() {
        let other_day = TimeWindow::parse("2026-10-17", "09:00", "10:00").expect("valid window");
        assert!(!window("09:00", "10:00").overlaps(&other_day));
    }

    #[test]
    fn parse_time_accepts_seconds_and_rejects_garbage() {
        assert_eq!(parse_time("09:30:00").map(|t| t.to_string()), Ok("09:30:00".to_owned()));
        assert_eq!(parse_time("9h30"), Err(DomainError::InvalidTimeFormat("9h30".to_owned())));
    }
}
