use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use roombot_core::config::CalendarConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{CalendarBackend, CalendarError, CalendarEvent, EventDraft, EventRange};

/// Google Calendar v3 client scoped to one calendar.
///
/// Authentication is a pre-issued bearer token; obtaining and refreshing it
/// happens outside roombot.
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    events_url: Url,
    access_token: SecretString,
}

impl GoogleCalendarClient {
    pub fn new(config: &CalendarConfig) -> Result<Self, CalendarError> {
        let access_token = config
            .access_token
            .clone()
            .ok_or_else(|| CalendarError::Config("calendar.access_token is not set".to_owned()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| CalendarError::Config(error.to_string()))?;

        Ok(Self {
            client,
            events_url: events_url(&config.api_base_url, &config.calendar_id)?,
            access_token,
        })
    }

    fn event_url(&self, id: &str) -> Result<Url, CalendarError> {
        let mut url = self.events_url.clone();
        url.path_segments_mut()
            .map_err(|_| CalendarError::Config("calendar api url cannot be a base".to_owned()))?
            .push(id);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CalendarError> {
        request
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|error| CalendarError::Transport(error.to_string()))
    }
}

fn events_url(base: &str, calendar_id: &str) -> Result<Url, CalendarError> {
    let mut url = Url::parse(base.trim_end_matches('/'))
        .map_err(|error| CalendarError::Config(format!("invalid calendar api url: {error}")))?;
    url.path_segments_mut()
        .map_err(|_| CalendarError::Config("calendar api url cannot be a base".to_owned()))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);
    Ok(url)
}

async fn ensure_success(response: Response) -> Result<Response, CalendarError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CalendarError::Status { status: status.as_u16(), body })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CalendarError> {
    response.json::<T>().await.map_err(|error| CalendarError::Decode(error.to_string()))
}

#[async_trait]
impl CalendarBackend for GoogleCalendarClient {
    async fn find_events(&self, range: EventRange) -> Result<Vec<CalendarEvent>, CalendarError> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeMin", range.time_min.to_rfc3339()),
                ("timeMax", range.time_max.to_rfc3339()),
                ("singleEvents", "true".to_owned()),
                ("orderBy", "startTime".to_owned()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response =
                self.send(self.client.get(self.events_url.clone()).query(&query)).await?;
            let page: EventList = decode(ensure_success(response).await?).await?;

            events.extend(page.items.into_iter().filter_map(GoogleEvent::into_calendar_event));
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            event_name = "calendar.google.events_listed",
            count = events.len(),
            time_min = %range.time_min,
            time_max = %range.time_max,
            "listed calendar events"
        );
        Ok(events)
    }

    async fn find_event(&self, id: &str) -> Result<Option<CalendarEvent>, CalendarError> {
        let response = self.send(self.client.get(self.event_url(id)?)).await?;
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Ok(None);
        }
        let event: GoogleEvent = decode(ensure_success(response).await?).await?;
        Ok(event.into_calendar_event())
    }

    async fn insert_event(&self, draft: EventDraft) -> Result<CalendarEvent, CalendarError> {
        let body = GoogleEventBody::from(&draft);
        let response = self.send(self.client.post(self.events_url.clone()).json(&body)).await?;
        let event: GoogleEvent = decode(ensure_success(response).await?).await?;
        let id = event.id.clone();
        event
            .into_calendar_event()
            .ok_or_else(|| CalendarError::Decode(format!("created event `{id}` has no timed slot")))
    }

    async fn update_event(
        &self,
        id: &str,
        draft: EventDraft,
    ) -> Result<CalendarEvent, CalendarError> {
        let body = GoogleEventBody::from(&draft);
        let response = self.send(self.client.put(self.event_url(id)?).json(&body)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CalendarError::NotFound(id.to_owned()));
        }
        let event: GoogleEvent = decode(ensure_success(response).await?).await?;
        event
            .into_calendar_event()
            .ok_or_else(|| CalendarError::Decode(format!("updated event `{id}` has no timed slot")))
    }

    async fn delete_event(&self, id: &str) -> Result<(), CalendarError> {
        let response = self.send(self.client.delete(self.event_url(id)?)).await?;
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Err(CalendarError::NotFound(id.to_owned()));
        }
        ensure_success(response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start: Option<EventTime>,
    #[serde(default)]
    end: Option<EventTime>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
}

impl GoogleEvent {
    /// Drops cancelled and all-day events.
    fn into_calendar_event(self) -> Option<CalendarEvent> {
        if self.status.as_deref() == Some("cancelled") {
            return None;
        }
        let start = self.start.and_then(|time| time.date_time)?;
        let end = self.end.and_then(|time| time.date_time)?;
        Some(CalendarEvent { id: self.id, summary: self.summary.unwrap_or_default(), start, end })
    }
}

#[derive(Debug, Serialize)]
struct GoogleEventBody {
    summary: String,
    start: EventTime,
    end: EventTime,
}

impl From<&EventDraft> for GoogleEventBody {
    fn from(draft: &EventDraft) -> Self {
        Self {
            summary: draft.summary.clone(),
            start: EventTime { date_time: Some(draft.start), date: None },
            end: EventTime { date_time: Some(draft.end), date: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::{events_url, EventList, GoogleEventBody};
    use crate::backend::EventDraft;

    #[test]
    fn events_url_escapes_calendar_id() {
        let url = events_url(
            "https://www.googleapis.com/calendar/v3/",
            "rooms@group.calendar.google.com",
        )
        .expect("valid url");

        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/rooms@group.calendar.google.com/events"
        );

        let with_space = events_url("https://example.test/v3", "team rooms").expect("valid url");
        assert_eq!(with_space.as_str(), "https://example.test/v3/calendars/team%20rooms/events");
    }

    #[test]
    fn event_list_skips_all_day_and_cancelled_events() {
        let page: EventList = serde_json::from_value(serde_json::json!({
            "items": [
                {
                    "id": "timed",
                    "summary": "Fuji/sync/Dana",
                    "start": {"dateTime": "2026-10-16T09:00:00+09:00"},
                    "end": {"dateTime": "2026-10-16T10:00:00+09:00"}
                },
                {
                    "id": "all-day",
                    "summary": "Holiday",
                    "start": {"date": "2026-10-16"},
                    "end": {"date": "2026-10-17"}
                },
                {"id": "gone", "status": "cancelled"}
            ],
            "nextPageToken": "page-2"
        }))
        .expect("event list decodes");

        assert_eq!(page.next_page_token.as_deref(), Some("page-2"));
        let events: Vec<_> =
            page.items.into_iter().filter_map(|event| event.into_calendar_event()).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "timed");
        assert_eq!(events[0].summary, "Fuji/sync/Dana");
    }

    #[test]
    fn draft_body_serializes_timed_slots() {
        let draft = EventDraft {
            summary: "Everest/Retro/Lee".to_owned(),
            start: DateTime::parse_from_rfc3339("2026-10-16T09:00:00+09:00").expect("rfc3339"),
            end: DateTime::parse_from_rfc3339("2026-10-16T10:00:00+09:00").expect("rfc3339"),
        };

        let body = serde_json::to_value(GoogleEventBody::from(&draft)).expect("serializes");

        assert_eq!(body["summary"], "Everest/Retro/Lee");
        assert_eq!(body["start"]["dateTime"], "2026-10-16T09:00:00+09:00");
        assert!(body["start"].get("date").is_none());
    }
}
