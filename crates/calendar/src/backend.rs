use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use thiserror::Error;

/// A timed calendar event as roombot sees it. All-day events never get here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl CalendarEvent {
    pub fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }

    pub fn overlaps(&self, range: &EventRange) -> bool {
        self.start < range.time_max && range.time_min < self.end
    }
}

/// Fields sent when creating or replacing an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDraft {
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// `[time_min, time_max)` query bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRange {
    pub time_min: DateTime<FixedOffset>,
    pub time_max: DateTime<FixedOffset>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("calendar request failed: {0}")]
    Transport(String),
    #[error("calendar api returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("calendar response could not be decoded: {0}")]
    Decode(String),
    #[error("calendar event `{0}` was not found")]
    NotFound(String),
    #[error("calendar client misconfigured: {0}")]
    Config(String),
}

#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn find_events(&self, range: EventRange) -> Result<Vec<CalendarEvent>, CalendarError>;

    async fn find_event(&self, id: &str) -> Result<Option<CalendarEvent>, CalendarError>;

    async fn insert_event(&self, draft: EventDraft) -> Result<CalendarEvent, CalendarError>;

    async fn update_event(
        &self,
        id: &str,
        draft: EventDraft,
    ) -> Result<CalendarEvent, CalendarError>;

    async fn delete_event(&self, id: &str) -> Result<(), CalendarError>;
}
