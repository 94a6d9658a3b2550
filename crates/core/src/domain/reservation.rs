use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::meeting_room::MeetingRoom;
use crate::domain::time_window::TimeWindow;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What the booker typed in: the parts of a reservation that are not its slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDetails {
    pub room: MeetingRoom,
    pub description: String,
    pub booker: String,
}

impl ReservationDetails {
    pub fn new(
        room: MeetingRoom,
        description: impl Into<String>,
        booker: impl Into<String>,
    ) -> Self {
        Self { room, description: description.into(), booker: booker.into() }
    }
}

/// A booked slot, backed 1:1 by a calendar event. Identity is the event id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    details: ReservationDetails,
    window: TimeWindow,
}

impl Reservation {
    pub fn new(id: ReservationId, details: ReservationDetails, window: TimeWindow) -> Self {
        Self { id, details, window }
    }

    pub fn id(&self) -> &ReservationId {
        &self.id
    }

    pub fn details(&self) -> &ReservationDetails {
        &self.details
    }

    pub fn room(&self) -> MeetingRoom {
        self.details.room
    }

    pub fn booker(&self) -> &str {
        &self.details.booker
    }

    pub fn description(&self) -> &str {
        &self.details.description
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn date(&self) -> NaiveDate {
        self.window.date()
    }

    pub fn is_same_booker(&self, booker: &str) -> bool {
        self.details.booker.trim() == booker.trim()
    }

    /// Same event id with new details and slot; used to describe a change.
    pub fn rescheduled(&self, details: ReservationDetails, window: TimeWindow) -> Self {
        Self { id: self.id.clone(), details, window }
    }
}

impl PartialEq for Reservation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Reservation {}

impl Hash for Reservation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Reservations derived from one calendar query, ordered by start time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReservationSet {
    reservations: Vec<Reservation>,
}

impl ReservationSet {
    pub fn new(mut reservations: Vec<Reservation>) -> Self {
        reservations.sort_by(|left, right| {
            (left.date(), left.window.start_time(), left.room())
                .cmp(&(right.date(), right.window.start_time(), right.room()))
        });
        Self { reservations }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reservation> {
        self.reservations.iter()
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    pub fn overlapping(&self, window: &TimeWindow) -> Self {
        Self {
            reservations: self
                .reservations
                .iter()
                .filter(|reservation| reservation.window.overlaps(window))
                .cloned()
                .collect(),
        }
    }

    pub fn booked_by(&self, booker: &str) -> Self {
        Self {
            reservations: self
                .reservations
                .iter()
                .filter(|reservation| reservation.is_same_booker(booker))
                .cloned()
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ReservationSet {
    type Item = &'a Reservation;
    type IntoIter = std::slice::Iter<'a, Reservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.reservations.iter()
    }
}
