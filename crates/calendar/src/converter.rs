use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use roombot_core::{MeetingRoom, Reservation, ReservationDetails, ReservationId, TimeWindow};

use crate::backend::{CalendarError, CalendarEvent, EventDraft, EventRange};

/// Maps calendar events to reservations and back.
///
/// The summary carries everything but the slot:
/// `"{room}{delimiter}{description}{delimiter}{booker}"`. Timestamps are
/// shifted into `offset` before they are split into a date and `HH:MM`.
#[derive(Clone, Debug)]
pub struct ReservationConverter {
    delimiter: String,
    offset: FixedOffset,
}

impl ReservationConverter {
    pub fn new(delimiter: impl Into<String>, offset: FixedOffset) -> Self {
        Self { delimiter: delimiter.into(), offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn summary(&self, details: &ReservationDetails) -> String {
        format!(
            "{room}{delim}{description}{delim}{booker}",
            room = details.room.name(),
            description = details.description.trim(),
            booker = details.booker.trim(),
            delim = self.delimiter,
        )
    }

    /// `None` for empty summaries, unknown rooms and summaries without all
    /// three parts. A description may itself contain the delimiter.
    pub fn to_reservation(&self, event: &CalendarEvent) -> Option<Reservation> {
        let start_date = event.start.with_timezone(&self.offset).date_naive();
        self.to_reservation_on(event, start_date)
    }

    /// The part of `event` that falls on `date`. Overnight events start at
    /// 00:00 on the days after their first and run to the end of every day
    /// but their last. `None` when the event does not touch `date`.
    pub fn to_reservation_on(&self, event: &CalendarEvent, date: NaiveDate) -> Option<Reservation> {
        if !event.has_summary() {
            return None;
        }

        let parts: Vec<&str> = event.summary.split(self.delimiter.as_str()).collect();
        if parts.len() < 3 {
            return None;
        }
        let room = MeetingRoom::from_name(parts[0]).ok()?;
        let booker = parts[parts.len() - 1].trim();
        let description = parts[1..parts.len() - 1].join(&self.delimiter);

        let start = event.start.with_timezone(&self.offset);
        let end = event.end.with_timezone(&self.offset);
        if start.date_naive() > date || end.date_naive() < date {
            return None;
        }
        let start_time =
            if start.date_naive() < date { NaiveTime::default() } else { start.time() };
        let end_time = if end.date_naive() > date { last_minute() } else { end.time() };
        let window = TimeWindow::new(date, start_time, end_time).ok()?;

        Some(Reservation::new(
            ReservationId(event.id.clone()),
            ReservationDetails::new(room, description.trim(), booker),
            window,
        ))
    }

    pub fn to_draft(
        &self,
        details: &ReservationDetails,
        window: &TimeWindow,
    ) -> Result<EventDraft, CalendarError> {
        Ok(EventDraft {
            summary: self.summary(details),
            start: self.at(window.date(), window.start_time())?,
            end: self.at(window.date(), window.end_time())?,
        })
    }

    pub fn range_for(&self, window: &TimeWindow) -> Result<EventRange, CalendarError> {
        Ok(EventRange {
            time_min: self.at(window.date(), window.start_time())?,
            time_max: self.at(window.date(), window.end_time())?,
        })
    }

    pub fn range_for_day(&self, date: NaiveDate) -> Result<EventRange, CalendarError> {
        let time_min = self.at(date, NaiveTime::default())?;
        Ok(EventRange { time_min, time_max: time_min + Duration::days(1) })
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<FixedOffset>, CalendarError> {
        NaiveDateTime::new(date, time).and_local_timezone(self.offset).single().ok_or_else(|| {
            CalendarError::Config(format!("{date} {time} has no single instant at {}", self.offset))
        })
    }
}

fn last_minute() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate};
    use roombot_core::{MeetingRoom, ReservationDetails, TimeWindow};

    use super::ReservationConverter;
    use crate::backend::CalendarEvent;

    fn seoul() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).expect("valid offset")
    }

    fn converter() -> ReservationConverter {
        ReservationConverter::new("/", seoul())
    }

    fn event(summary: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            id: "evt-1".to_owned(),
            summary: summary.to_owned(),
            start: DateTime::parse_from_rfc3339(start).expect("rfc3339"),
            end: DateTime::parse_from_rfc3339(end).expect("rfc3339"),
        }
    }

    #[test]
    fn parses_summary_and_shifts_to_local_offset() {
        let reservation = converter()
            .to_reservation(&event(
                "Fuji/Weekly sync/Dana",
                "2026-10-16T00:00:00Z",
                "2026-10-16T01:30:00Z",
            ))
            .expect("convertible event");

        assert_eq!(reservation.room(), MeetingRoom::Fuji);
        assert_eq!(reservation.description(), "Weekly sync");
        assert_eq!(reservation.booker(), "Dana");
        assert_eq!(reservation.window().to_string(), "2026-10-16 09:00-10:30");
    }

    #[test]
    fn skips_empty_and_malformed_summaries() {
        let converter = converter();
        let start = "2026-10-16T09:00:00+09:00";
        let end = "2026-10-16T10:00:00+09:00";

        assert!(converter.to_reservation(&event("   ", start, end)).is_none());
        assert!(converter.to_reservation(&event("Fuji/only two", start, end)).is_none());
        assert!(converter.to_reservation(&event("Atlantis/sync/Dana", start, end)).is_none());
    }

    #[test]
    fn description_may_contain_the_delimiter() {
        let reservation = converter()
            .to_reservation(&event(
                "everest/Q4 / planning/Sam",
                "2026-10-16T13:00:00+09:00",
                "2026-10-16T14:00:00+09:00",
            ))
            .expect("convertible event");

        assert_eq!(reservation.room(), MeetingRoom::Everest);
        assert_eq!(reservation.description(), "Q4 / planning");
        assert_eq!(reservation.booker(), "Sam");
    }

    #[test]
    fn event_past_midnight_is_clamped_to_end_of_day() {
        let reservation = converter()
            .to_reservation(&event(
                "Denali/offsite/Kim",
                "2026-10-16T22:00:00+09:00",
                "2026-10-17T01:00:00+09:00",
            ))
            .expect("convertible event");

        assert_eq!(reservation.window().formatted_end_time(), "23:59");
    }

    #[test]
    fn overnight_event_blocks_the_start_of_the_next_day() {
        let overnight = event(
            "Denali/offsite/Kim",
            "2026-10-16T22:00:00+09:00",
            "2026-10-17T01:00:00+09:00",
        );
        let next_day = NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date");

        let reservation =
            converter().to_reservation_on(&overnight, next_day).expect("part on the next day");

        assert_eq!(reservation.window().to_string(), "2026-10-17 00:00-01:00");
        assert_eq!(reservation.id().as_str(), "evt-1");
    }

    #[test]
    fn events_not_touching_the_date_convert_to_none() {
        let converter = converter();
        let ends_at_midnight = event(
            "Denali/offsite/Kim",
            "2026-10-16T22:00:00+09:00",
            "2026-10-17T00:00:00+09:00",
        );
        let day_before = NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date");
        let next_day = NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date");

        assert!(converter.to_reservation_on(&ends_at_midnight, day_before).is_none());
        assert!(converter.to_reservation_on(&ends_at_midnight, next_day).is_none());
    }

    #[test]
    fn draft_uses_custom_delimiter_and_local_offset() {
        let converter = ReservationConverter::new("|", seoul());
        let window = TimeWindow::parse("2026-10-16", "09:00", "10:00").expect("valid window");
        let draft = converter
            .to_draft(&ReservationDetails::new(MeetingRoom::Elbrus, " Retro ", "Lee"), &window)
            .expect("draft");

        assert_eq!(draft.summary, "Elbrus|Retro|Lee");
        assert_eq!(draft.start.to_rfc3339(), "2026-10-16T09:00:00+09:00");
        assert_eq!(draft.end.to_rfc3339(), "2026-10-16T10:00:00+09:00");
    }

    #[test]
    fn day_range_spans_local_midnight_to_midnight() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        let range = converter().range_for_day(date).expect("range");

        assert_eq!(range.time_min.to_rfc3339(), "2026-10-16T00:00:00+09:00");
        assert_eq!(range.time_max.to_rfc3339(), "2026-10-17T00:00:00+09:00");
    }
}
