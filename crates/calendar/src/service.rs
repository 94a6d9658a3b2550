use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use roombot_core::config::{CalendarBackendKind, CalendarConfig};
use roombot_core::{
    ApplicationError, AvailabilityResolver, DomainError, MeetingRoom, Reservation,
    ReservationDetails, ReservationSet, TimeWindow,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{CalendarBackend, CalendarError, CalendarEvent, EventRange};
use crate::converter::ReservationConverter;
use crate::google::GoogleCalendarClient;
use crate::memory::InMemoryCalendar;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("calendar event `{0}` is not a reservation")]
    InvalidEvent(String),
}

impl From<ReservationError> for ApplicationError {
    fn from(value: ReservationError) -> Self {
        match value {
            ReservationError::Domain(error) => Self::Domain(error),
            ReservationError::InvalidEvent(id) => {
                Self::NotFound(format!("reservation `{id}` does not exist"))
            }
            ReservationError::Calendar(CalendarError::NotFound(id)) => {
                Self::NotFound(format!("reservation `{id}` does not exist"))
            }
            ReservationError::Calendar(CalendarError::Config(message)) => {
                Self::Configuration(message)
            }
            ReservationError::Calendar(error) => Self::Calendar(error.to_string()),
        }
    }
}

/// Reservation use cases backed by one calendar.
#[derive(Clone)]
pub struct ReservationService {
    backend: Arc<dyn CalendarBackend>,
    converter: ReservationConverter,
    resolver: AvailabilityResolver,
}

impl ReservationService {
    pub fn new(backend: Arc<dyn CalendarBackend>, converter: ReservationConverter) -> Self {
        Self { backend, converter, resolver: AvailabilityResolver::default() }
    }

    /// Builds the backend `config` selects. The memory backend starts empty.
    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        let offset = config.offset().map_err(|error| CalendarError::Config(error.to_string()))?;
        let backend: Arc<dyn CalendarBackend> = match config.backend {
            CalendarBackendKind::Google => Arc::new(GoogleCalendarClient::new(config)?),
            CalendarBackendKind::Memory => Arc::new(InMemoryCalendar::default()),
        };
        info!(
            event_name = "calendar.backend.selected",
            backend = ?config.backend,
            utc_offset = %offset,
            "calendar backend ready"
        );
        Ok(Self::new(backend, ReservationConverter::new(config.summary_delimiter.clone(), offset)))
    }

    pub fn converter(&self) -> &ReservationConverter {
        &self.converter
    }

    /// Reservations overlapping `window`, ordered by start time.
    pub async fn retrieve(&self, window: &TimeWindow) -> Result<ReservationSet, ReservationError> {
        let range = self.converter.range_for(window)?;
        Ok(self.load(range, window.date()).await?.overlapping(window))
    }

    pub async fn retrieve_day(&self, date: NaiveDate) -> Result<ReservationSet, ReservationError> {
        let range = self.converter.range_for_day(date)?;
        self.load(range, date).await
    }

    pub async fn retrieve_by_booker(
        &self,
        date: NaiveDate,
        booker: &str,
    ) -> Result<ReservationSet, ReservationError> {
        Ok(self.retrieve_day(date).await?.booked_by(booker))
    }

    pub async fn retrieve_by_id(&self, id: &str) -> Result<Reservation, ReservationError> {
        let event = self
            .backend
            .find_event(id)
            .await?
            .ok_or_else(|| ReservationError::InvalidEvent(id.to_owned()))?;
        self.convert(&event)
    }

    pub async fn available_rooms(
        &self,
        window: &TimeWindow,
    ) -> Result<BTreeSet<MeetingRoom>, ReservationError> {
        let day = self.retrieve_day(window.date()).await?;
        Ok(self.resolver.available_rooms(window, &day))
    }

    pub async fn reserve(
        &self,
        details: ReservationDetails,
        window: TimeWindow,
    ) -> Result<Reservation, ReservationError> {
        let day = self.retrieve_day(window.date()).await?;
        if let Some(existing) = self.resolver.first_conflict(details.room, &window, None, &day) {
            warn!(
                event_name = "calendar.reservation.conflict",
                room = %details.room,
                requested = %window,
                blocking_id = existing.id().as_str(),
                "reservation rejected by conflict check"
            );
            return Err(conflict(details.room, &window));
        }

        let draft = self.converter.to_draft(&details, &window)?;
        let event = self.backend.insert_event(draft).await?;
        let reservation = self.convert(&event)?;
        info!(
            event_name = "calendar.reservation.created",
            reservation_id = reservation.id().as_str(),
            room = %reservation.room(),
            window = %reservation.window(),
            "reservation created"
        );
        Ok(reservation)
    }

    /// Replaces the event behind `reservation` with its current details and
    /// slot. The reservation's own event never counts as a conflict.
    pub async fn change(&self, reservation: &Reservation) -> Result<Reservation, ReservationError> {
        let day = self.retrieve_day(reservation.date()).await?;
        if self.resolver.has_conflict(reservation, &day) {
            warn!(
                event_name = "calendar.reservation.conflict",
                reservation_id = reservation.id().as_str(),
                room = %reservation.room(),
                requested = %reservation.window(),
                "reservation change rejected by conflict check"
            );
            return Err(conflict(reservation.room(), reservation.window()));
        }

        let draft = self.converter.to_draft(reservation.details(), reservation.window())?;
        let event = self.backend.update_event(reservation.id().as_str(), draft).await?;
        let changed = self.convert(&event)?;
        info!(
            event_name = "calendar.reservation.changed",
            reservation_id = changed.id().as_str(),
            room = %changed.room(),
            window = %changed.window(),
            "reservation changed"
        );
        Ok(changed)
    }

    pub async fn cancel(&self, reservation: &Reservation) -> Result<(), ReservationError> {
        self.backend.delete_event(reservation.id().as_str()).await?;
        info!(
            event_name = "calendar.reservation.cancelled",
            reservation_id = reservation.id().as_str(),
            room = %reservation.room(),
            "reservation cancelled"
        );
        Ok(())
    }

    /// Cheap reachability check: lists today's events.
    pub async fn probe(&self) -> Result<usize, ReservationError> {
        let range = self.converter.range_for_day(self.converter.today())?;
        Ok(self.backend.find_events(range).await?.len())
    }

    /// Events in `range`, each clipped to its part on `date`.
    async fn load(
        &self,
        range: EventRange,
        date: NaiveDate,
    ) -> Result<ReservationSet, ReservationError> {
        let events = self.backend.find_events(range).await?;
        let reservations =
            events.iter().filter_map(|event| self.converter.to_reservation_on(event, date));
        Ok(ReservationSet::new(reservations.collect()))
    }

    fn convert(&self, event: &CalendarEvent) -> Result<Reservation, ReservationError> {
        self.converter
            .to_reservation(event)
            .ok_or_else(|| ReservationError::InvalidEvent(event.id.clone()))
    }
}

fn conflict(room: MeetingRoom, window: &TimeWindow) -> ReservationError {
    ReservationError::Domain(DomainError::ReservationConflict { room, window: window.to_string() })
}
