use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::{CalendarBackend, CalendarError, CalendarEvent, EventDraft, EventRange};

#[derive(Default)]
pub struct InMemoryCalendar {
    events: RwLock<HashMap<String, CalendarEvent>>,
}

impl InMemoryCalendar {
    pub fn with_events(events: impl IntoIterator<Item = CalendarEvent>) -> Self {
        Self {
            events: RwLock::new(
                events.into_iter().map(|event| (event.id.clone(), event)).collect(),
            ),
        }
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl CalendarBackend for InMemoryCalendar {
    async fn find_events(&self, range: EventRange) -> Result<Vec<CalendarEvent>, CalendarError> {
        let events = self.events.read().await;
        let mut found: Vec<CalendarEvent> =
            events.values().filter(|event| event.overlaps(&range)).cloned().collect();
        found.sort_by(|left, right| left.start.cmp(&right.start).then(left.id.cmp(&right.id)));
        Ok(found)
    }

    async fn find_event(&self, id: &str) -> Result<Option<CalendarEvent>, CalendarError> {
        let events = self.events.read().await;
        Ok(events.get(id).cloned())
    }

    async fn insert_event(&self, draft: EventDraft) -> Result<CalendarEvent, CalendarError> {
        let event = CalendarEvent {
            id: Uuid::new_v4().simple().to_string(),
            summary: draft.summary,
            start: draft.start,
            end: draft.end,
        };
        let mut events = self.events.write().await;
        events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn update_event(
        &self,
        id: &str,
        draft: EventDraft,
    ) -> Result<CalendarEvent, CalendarError> {
        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(id) else {
            return Err(CalendarError::NotFound(id.to_owned()));
        };
        event.summary = draft.summary;
        event.start = draft.start;
        event.end = draft.end;
        Ok(event.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<(), CalendarError> {
        let mut events = self.events.write().await;
        events.remove(id).map(|_| ()).ok_or_else(|| CalendarError::NotFound(id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::InMemoryCalendar;
    use crate::backend::{CalendarBackend, CalendarError, CalendarEvent, EventDraft, EventRange};

    fn at(value: &str) -> chrono::DateTime<chrono::FixedOffset> {
        DateTime::parse_from_rfc3339(value).expect("rfc3339")
    }

    fn event(id: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_owned(),
            summary: "Fuji/sync/Dana".to_owned(),
            start: at(start),
            end: at(end),
        }
    }

    #[tokio::test]
    async fn find_events_returns_overlapping_events_in_start_order() {
        let calendar = InMemoryCalendar::with_events([
            event("late", "2026-10-16T15:00:00+09:00", "2026-10-16T16:00:00+09:00"),
            event("early", "2026-10-16T09:00:00+09:00", "2026-10-16T10:00:00+09:00"),
            event("next-day", "2026-10-17T09:00:00+09:00", "2026-10-17T10:00:00+09:00"),
        ]);

        let found = calendar
            .find_events(EventRange {
                time_min: at("2026-10-16T00:00:00+09:00"),
                time_max: at("2026-10-17T00:00:00+09:00"),
            })
            .await
            .expect("find events");

        let ids: Vec<&str> = found.iter().map(|event| event.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn insert_update_delete_cycle() {
        let calendar = InMemoryCalendar::default();
        let created = calendar
            .insert_event(EventDraft {
                summary: "Everest/Retro/Lee".to_owned(),
                start: at("2026-10-16T09:00:00+09:00"),
                end: at("2026-10-16T10:00:00+09:00"),
            })
            .await
            .expect("insert");
        assert!(!created.id.is_empty());

        let updated = calendar
            .update_event(
                &created.id,
                EventDraft {
                    summary: "Everest/Retro/Lee".to_owned(),
                    start: at("2026-10-16T11:00:00+09:00"),
                    end: at("2026-10-16T12:00:00+09:00"),
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.start, at("2026-10-16T11:00:00+09:00"));

        calendar.delete_event(&created.id).await.expect("delete");
        assert!(calendar.is_empty().await);
        assert_eq!(
            calendar.delete_event(&created.id).await,
            Err(CalendarError::NotFound(created.id.clone()))
        );
    }
}
