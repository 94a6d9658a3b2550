pub mod availability;
pub mod config;
pub mod domain;
pub mod errors;

pub use availability::AvailabilityResolver;
pub use domain::meeting_room::MeetingRoom;
pub use domain::reservation::{Reservation, ReservationDetails, ReservationId, ReservationSet};
pub use domain::time_window::{parse_date, parse_time, TimeWindow, DATE_FORMAT, TIME_FORMAT};
pub use errors::{ApplicationError, DomainError, InterfaceError};
