use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use roombot_calendar::ReservationService;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    service: ReservationService,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub calendar: HealthCheck,
    pub checked_at: String,
}

pub fn router(service: ReservationService) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { service })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let calendar = calendar_check(&state.service).await;
    let ready = calendar.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "roombot-server accepting slack requests".to_string(),
        },
        calendar,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn calendar_check(service: &ReservationService) -> HealthCheck {
    match service.probe().await {
        Ok(count) => HealthCheck {
            status: "ready",
            detail: format!("calendar query succeeded ({count} events today)"),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("calendar query failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use chrono::FixedOffset;
    use roombot_calendar::{
        CalendarBackend, CalendarError, CalendarEvent, EventDraft, EventRange, InMemoryCalendar,
        ReservationConverter, ReservationService,
    };

    use crate::health::{health, HealthState};

    struct UnreachableCalendar;

    #[async_trait]
    impl CalendarBackend for UnreachableCalendar {
        async fn find_events(
            &self,
            _range: EventRange,
        ) -> Result<Vec<CalendarEvent>, CalendarError> {
            Err(CalendarError::Transport("connection refused".to_owned()))
        }

        async fn find_event(&self, _id: &str) -> Result<Option<CalendarEvent>, CalendarError> {
            Err(CalendarError::Transport("connection refused".to_owned()))
        }

        async fn insert_event(&self, _draft: EventDraft) -> Result<CalendarEvent, CalendarError> {
            Err(CalendarError::Transport("connection refused".to_owned()))
        }

        async fn update_event(
            &self,
            _id: &str,
            _draft: EventDraft,
        ) -> Result<CalendarEvent, CalendarError> {
            Err(CalendarError::Transport("connection refused".to_owned()))
        }

        async fn delete_event(&self, _id: &str) -> Result<(), CalendarError> {
            Err(CalendarError::Transport("connection refused".to_owned()))
        }
    }

    fn state(backend: Arc<dyn CalendarBackend>) -> HealthState {
        let offset = FixedOffset::east_opt(9 * 3600).expect("valid offset");
        HealthState {
            service: ReservationService::new(backend, ReservationConverter::new("/", offset)),
        }
    }

    #[tokio::test]
    async fn health_returns_ready_when_calendar_answers() {
        let backend = Arc::new(InMemoryCalendar::default());
        let (status, Json(payload)) = health(State(state(backend))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.calendar.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_calendar_is_unreachable() {
        let (status, Json(payload)) = health(State(state(Arc::new(UnreachableCalendar)))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.calendar.status, "degraded");
        assert!(payload.calendar.detail.contains("connection refused"));
        assert_eq!(payload.service.status, "ready");
    }
}
