//! Room availability and reservation conflict checks.
//!
//! Everything here is pure: callers pass the reservations already booked on
//! the requested date and get back a room set or a yes/no answer. Windows
//! with `end <= start` cannot be constructed, so they never reach this code.

use std::collections::BTreeSet;

use crate::domain::meeting_room::MeetingRoom;
use crate::domain::reservation::{Reservation, ReservationId};
use crate::domain::time_window::TimeWindow;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityResolver {
    rooms: BTreeSet<MeetingRoom>,
}

impl Default for AvailabilityResolver {
    fn default() -> Self {
        Self::new(MeetingRoom::ALL)
    }
}

impl AvailabilityResolver {
    pub fn new(rooms: impl IntoIterator<Item = MeetingRoom>) -> Self {
        Self { rooms: rooms.into_iter().collect() }
    }

    /// Rooms with no reservation intersecting `window`.
    pub fn available_rooms<'a, I>(
        &self,
        window: &TimeWindow,
        reservations: I,
    ) -> BTreeSet<MeetingRoom>
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        let mut available = self.rooms.clone();
        for reservation in reservations {
            if reservation.window().overlaps(window) {
                available.remove(&reservation.room());
            }
        }
        available
    }

    /// True when another reservation in the same room overlaps `target`.
    /// A reservation sharing the target's id is the target itself and is skipped.
    pub fn has_conflict<'a, I>(&self, target: &Reservation, reservations: I) -> bool
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        self.first_conflict(target.room(), target.window(), Some(target.id()), reservations)
            .is_some()
    }

    pub fn first_conflict<'a, I>(
        &self,
        room: MeetingRoom,
        window: &TimeWindow,
        exclude: Option<&ReservationId>,
        reservations: I,
    ) -> Option<&'a Reservation>
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        reservations.into_iter().find(|existing| {
            exclude != Some(existing.id())
                && existing.room() == room
                && existing.window().overlaps(window)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::AvailabilityResolver;
    use crate::domain::meeting_room::MeetingRoom;
    use crate::domain::reservation::{Reservation, ReservationDetails, ReservationId};
    use crate::domain::time_window::TimeWindow;

    const A: MeetingRoom = MeetingRoom::Everest;
    const B: MeetingRoom = MeetingRoom::Fuji;

    fn window(start: &str, end: &str) -> TimeWindow {
        TimeWindow::parse("2026-10-16", start, end).expect("valid window")
    }

    fn booked(id: &str, room: MeetingRoom, start: &str, end: &str) -> Reservation {
        Reservation::new(
            ReservationId(id.to_owned()),
            ReservationDetails::new(room, "standup", "Dana"),
            window(start, end),
        )
    }

    fn two_rooms() -> AvailabilityResolver {
        AvailabilityResolver::new([A, B])
    }

    #[test]
    fn back_to_back_request_keeps_every_room() {
        let existing = vec![booked("x", A, "09:00", "10:00")];

        let available = two_rooms().available_rooms(&window("10:00", "11:00"), &existing);

        assert_eq!(available, BTreeSet::from([A, B]));
    }

    #[test]
    fn overlapping_request_removes_the_booked_room() {
        let existing = vec![booked("x", A, "09:00", "10:00")];

        let available = two_rooms().available_rooms(&window("09:30", "10:30"), &existing);

        assert_eq!(available, BTreeSet::from([B]));
    }

    #[test]
    fn reservation_starting_with_the_request_blocks_the_room() {
        let existing = vec![booked("x", A, "09:00", "09:30")];

        let available = two_rooms().available_rooms(&window("09:00", "10:00"), &existing);

        assert_eq!(available, BTreeSet::from([B]));
    }

    #[test]
    fn non_overlapping_reservations_leave_the_full_room_set() {
        let resolver = AvailabilityResolver::default();
        let existing = vec![
            booked("a", MeetingRoom::Denali, "07:00", "08:00"),
            booked("b", MeetingRoom::Elbrus, "12:00", "13:00"),
            booked("c", MeetingRoom::Kilimanjaro, "11:00", "12:00"),
        ];

        let available = resolver.available_rooms(&window("08:00", "11:00"), &existing);

        assert_eq!(available, MeetingRoom::ALL.into_iter().collect::<BTreeSet<_>>());
    }

    #[test]
    fn never_returns_a_room_with_an_overlapping_reservation() {
        let resolver = AvailabilityResolver::default();
        let existing = vec![
            booked("a", MeetingRoom::Denali, "09:00", "12:00"),
            booked("b", MeetingRoom::Fuji, "10:50", "11:10"),
            booked("c", MeetingRoom::Everest, "11:00", "12:00"),
        ];
        let request = window("10:00", "11:00");

        let available = resolver.available_rooms(&request, &existing);

        for reservation in &existing {
            if reservation.window().overlaps(&request) {
                assert!(!available.contains(&reservation.room()), "{} leaked", reservation.room());
            }
        }
        assert!(available.contains(&MeetingRoom::Everest));
    }

    #[test]
    fn repeated_calls_give_identical_results() {
        let resolver = two_rooms();
        let existing = vec![booked("x", A, "09:00", "10:00")];
        let request = window("09:30", "10:30");

        assert_eq!(
            resolver.available_rooms(&request, &existing),
            resolver.available_rooms(&request, &existing)
        );
    }

    #[test]
    fn updating_a_reservation_does_not_conflict_with_itself() {
        let original = booked("x", A, "09:00", "10:00");
        let moved = original.rescheduled(original.details().clone(), window("09:30", "10:30"));

        assert!(!two_rooms().has_conflict(&moved, [&original]));
    }

    #[test]
    fn overlap_in_the_same_room_is_a_conflict() {
        let existing = vec![booked("x", A, "09:00", "10:00")];
        let candidate = booked("y", A, "09:45", "10:15");

        assert!(two_rooms().has_conflict(&candidate, &existing));
    }

    #[test]
    fn overlap_in_another_room_is_not_a_conflict() {
        let existing = vec![booked("x", A, "09:00", "10:00")];
        let candidate = booked("y", B, "09:00", "10:00");

        assert!(!two_rooms().has_conflict(&candidate, &existing));
    }

    #[test]
    fn first_conflict_reports_the_blocking_reservation() {
        let existing = vec![booked("x", A, "08:00", "09:00"), booked("z", A, "09:00", "10:00")];

        let blocking = two_rooms().first_conflict(A, &window("09:15", "09:45"), None, &existing);

        assert_eq!(blocking.map(|r| r.id().as_str()), Some("z"));
    }
}
